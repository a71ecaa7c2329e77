//! 学习资料（materi）

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::materials::{
    entities::{Material, validate_material_content},
    requests::{CreateMaterialRequest, UpdateMaterialRequest},
    responses::MaterialListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, class_access, current_user, managed_class, not_found, storage_failure,
};
use crate::storage::Storage;
use crate::utils::validate::{validate_required_text, validate_url};

const TITLE_MAX: usize = 200;

super::define_service!(MaterialService);

fn check_urls(urls: &[Option<&str>]) -> ActixResult<()> {
    for url in urls.iter().flatten().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(|msg| bad_request(ErrorCode::MaterialInvalid, msg))?;
    }
    Ok(())
}

/// 读取资料并确认属于当前班级
async fn load_material(
    storage: &dyn Storage,
    class_id: i64,
    material_id: i64,
) -> ActixResult<Material> {
    storage
        .get_material_by_id(material_id)
        .await
        .map_err(storage_failure("Failed to get material"))?
        .filter(|m| m.class_id == class_id)
        .ok_or_else(|| not_found(ErrorCode::MaterialNotFound, "Material not found"))
}

impl MaterialService {
    pub async fn list_materials(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = class_access(request)?;

        let items = storage
            .list_materials(access.class.id)
            .await
            .map_err(storage_failure("Failed to list materials"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            MaterialListResponse { items },
            "Materials retrieved successfully",
        )))
    }

    pub async fn get_material(
        &self,
        request: &HttpRequest,
        material_id: i64,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = class_access(request)?;
        let material = load_material(storage.as_ref(), access.class.id, material_id).await?;
        Ok(HttpResponse::Ok().json(ApiResponse::success(material, "Material retrieved")))
    }

    pub async fn create_material(
        &self,
        request: &HttpRequest,
        mut body: CreateMaterialRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        let user = current_user(request)?;

        body.title = body.title.trim().to_string();
        validate_required_text(&body.title, TITLE_MAX)
            .map_err(|msg| bad_request(ErrorCode::MaterialInvalid, format!("title: {msg}")))?;
        validate_material_content(body.kind, body.url.as_deref(), body.text_content.as_deref())
            .map_err(|msg| bad_request(ErrorCode::MaterialInvalid, msg))?;
        check_urls(&[body.url.as_deref(), body.cover_url.as_deref()])?;

        let material = storage
            .create_material(access.class.id, user.id, body)
            .await
            .map_err(storage_failure("Material creation failed"))?;

        Ok(HttpResponse::Created()
            .json(ApiResponse::success(material, "Material created successfully")))
    }

    pub async fn update_material(
        &self,
        request: &HttpRequest,
        material_id: i64,
        mut body: UpdateMaterialRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        let existing = load_material(storage.as_ref(), access.class.id, material_id).await?;

        if let Some(title) = body.title.as_mut() {
            *title = title.trim().to_string();
            validate_required_text(title, TITLE_MAX)
                .map_err(|msg| bad_request(ErrorCode::MaterialInvalid, format!("title: {msg}")))?;
        }

        // 合并后的内容仍需满足类型要求
        let kind = body.kind.unwrap_or(existing.kind);
        let url = body.url.as_deref().or(existing.url.as_deref());
        let text = body.text_content.as_deref().or(existing.text_content.as_deref());
        validate_material_content(kind, url, text)
            .map_err(|msg| bad_request(ErrorCode::MaterialInvalid, msg))?;
        check_urls(&[body.url.as_deref(), body.cover_url.as_deref()])?;

        let material = storage
            .update_material(material_id, body)
            .await
            .map_err(storage_failure("Material update failed"))?
            .ok_or_else(|| not_found(ErrorCode::MaterialNotFound, "Material not found"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(material, "Material updated successfully")))
    }

    pub async fn delete_material(
        &self,
        request: &HttpRequest,
        material_id: i64,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        load_material(storage.as_ref(), access.class.id, material_id).await?;

        storage
            .delete_material(material_id)
            .await
            .map_err(storage_failure("Material deletion failed"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Material deleted successfully")))
    }
}
