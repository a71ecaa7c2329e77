use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::create::ensure_guru;
use super::{CLASS_NAME_MAX, ClassService};
use crate::models::classes::entities::ClassRelation;
use crate::models::classes::requests::UpdateClassRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, forbidden, managed_class, not_found, storage_failure};
use crate::utils::validate::{validate_required_text, validate_url};

pub async fn update_class(
    service: &ClassService,
    request: &HttpRequest,
    mut update_data: UpdateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;

    if let Some(name) = update_data.name.as_mut() {
        *name = name.trim().to_string();
        validate_required_text(name, CLASS_NAME_MAX)
            .map_err(|msg| bad_request(ErrorCode::BadRequest, format!("name: {msg}")))?;
    }
    if let Some(url) = update_data.cover_url.as_deref().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(|msg| bad_request(ErrorCode::BadRequest, msg))?;
    }

    // 仅管理员可以更换负责教师
    if let Some(teacher_id) = update_data.teacher_id
        && teacher_id != access.class.teacher_id
    {
        if access.relation != ClassRelation::Admin {
            return Err(forbidden(
                ErrorCode::ClassPermissionDenied,
                "Only an admin can change the class teacher",
            ));
        }
        ensure_guru(teacher_id, &storage).await?;
    }

    let class = storage
        .update_class(access.class.id, update_data)
        .await
        .map_err(storage_failure("Class update failed"))?
        .ok_or_else(|| not_found(ErrorCode::ClassNotFound, "Class not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(class, "Class updated successfully")))
}
