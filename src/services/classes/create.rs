use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{CLASS_NAME_MAX, ClassService};
use crate::models::classes::requests::CreateClassRequest;
use crate::models::users::entities::{User, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, forbidden, not_found, storage_failure};
use crate::storage::Storage;
use crate::utils::validate::{validate_required_text, validate_url};

pub async fn create_class(
    service: &ClassService,
    request: &HttpRequest,
    mut class_data: CreateClassRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    class_data.name = class_data.name.trim().to_string();
    validate_required_text(&class_data.name, CLASS_NAME_MAX)
        .map_err(|msg| bad_request(ErrorCode::BadRequest, format!("name: {msg}")))?;
    if let Some(url) = class_data.cover_url.as_deref().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(|msg| bad_request(ErrorCode::BadRequest, msg))?;
    }

    let teacher_id = resolve_teacher(&user, class_data.teacher_id, &storage).await?;

    let class = storage
        .create_class(teacher_id, class_data)
        .await
        .map_err(storage_failure("Class creation failed"))?;

    info!("Class {} created by {} for guru {}", class.id, user.id, teacher_id);
    Ok(HttpResponse::Created().json(ApiResponse::success(class, "Class created successfully")))
}

/// 确定班级负责教师
///
/// guru 只能为自己创建；admin 必须指定一名 guru。
pub(super) async fn resolve_teacher(
    user: &User,
    requested: Option<i64>,
    storage: &Arc<dyn Storage>,
) -> ActixResult<i64> {
    match user.role {
        UserRole::Guru => match requested {
            Some(id) if id != user.id => Err(forbidden(
                ErrorCode::ClassPermissionDenied,
                "You do not have permission to create a class for another teacher",
            )),
            _ => Ok(user.id),
        },
        UserRole::Admin => {
            let teacher_id = requested.ok_or_else(|| {
                bad_request(ErrorCode::BadRequest, "teacher_id is required")
            })?;
            ensure_guru(teacher_id, storage).await?;
            Ok(teacher_id)
        }
        UserRole::Murid => Err(forbidden(
            ErrorCode::ClassPermissionDenied,
            "You do not have permission to create a class",
        )),
    }
}

pub(super) async fn ensure_guru(teacher_id: i64, storage: &Arc<dyn Storage>) -> ActixResult<()> {
    let teacher = storage
        .get_user_by_id(teacher_id)
        .await
        .map_err(storage_failure("Failed to get teacher"))?
        .ok_or_else(|| not_found(ErrorCode::UserNotFound, "Teacher not found"))?;
    if teacher.role != UserRole::Guru {
        return Err(bad_request(
            ErrorCode::UserRoleInvalid,
            "Classes can only be assigned to a guru",
        ));
    }
    Ok(())
}
