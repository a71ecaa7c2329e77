use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::mentors::requests::{CreateMentorRequest, UpdateMentorRequest};
use crate::models::users::entities::UserRole;
use crate::services::MentorService;
use crate::utils::SafeIDI64;

static MENTOR_SERVICE: Lazy<MentorService> = Lazy::new(MentorService::new_lazy);

pub async fn list_mentors(req: HttpRequest) -> ActixResult<HttpResponse> {
    MENTOR_SERVICE.list_mentors(&req).await
}

pub async fn create_mentor(
    req: HttpRequest,
    body: web::Json<CreateMentorRequest>,
) -> ActixResult<HttpResponse> {
    MENTOR_SERVICE.create_mentor(&req, body.into_inner()).await
}

pub async fn update_mentor(
    req: HttpRequest,
    id: SafeIDI64,
    body: web::Json<UpdateMentorRequest>,
) -> ActixResult<HttpResponse> {
    MENTOR_SERVICE
        .update_mentor(&req, id.0, body.into_inner())
        .await
}

pub async fn delete_mentor(req: HttpRequest, id: SafeIDI64) -> ActixResult<HttpResponse> {
    MENTOR_SERVICE.delete_mentor(&req, id.0).await
}

// 导师列表公开展示，维护仅管理员
pub fn configure_mentor_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/mentors")
            .route("", web::get().to(list_mentors))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
                    .wrap(middlewares::RequireJWT)
                    .route("", web::post().to(create_mentor))
                    .route("/{id}", web::put().to(update_mentor))
                    .route("/{id}", web::delete().to(delete_mentor)),
            ),
    );
}
