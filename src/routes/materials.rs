use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::materials::requests::{CreateMaterialRequest, UpdateMaterialRequest};
use crate::services::MaterialService;
use crate::utils::SafeIDI64;

static MATERIAL_SERVICE: Lazy<MaterialService> = Lazy::new(MaterialService::new_lazy);

pub async fn list_materials(req: HttpRequest) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.list_materials(&req).await
}

pub async fn create_material(
    req: HttpRequest,
    body: web::Json<CreateMaterialRequest>,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE
        .create_material(&req, body.into_inner())
        .await
}

pub async fn get_material(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.get_material(&req, id.0).await
}

pub async fn update_material(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateMaterialRequest>,
) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE
        .update_material(&req, id.0, body.into_inner())
        .await
}

pub async fn delete_material(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    MATERIAL_SERVICE.delete_material(&req, id.0).await
}

// 成员可读，写操作在业务层要求管理权限
pub fn configure_material_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes/{class_id}/materials")
            .wrap(middlewares::RequireClassAccess::members())
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_materials))
            .route("", web::post().to(create_material))
            .route("/{id}", web::get().to(get_material))
            .route("/{id}", web::put().to(update_material))
            .route("/{id}", web::delete().to(delete_material)),
    );
}
