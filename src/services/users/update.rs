use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};

use super::{UserService, hashed_password};
use crate::errors::LmsError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserStatus, requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::{bad_request, current_user, not_found, reject, storage_failure};
use crate::utils::validate::{validate_email, validate_password};

pub async fn update_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
    mut update_data: UpdateUserRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let operator = current_user(request)?;

    // 管理员不能降低自己的权限或停用自己
    if operator.id == user_id
        && (update_data.role.is_some_and(|r| r != operator.role)
            || update_data.status.is_some_and(|s| s != UserStatus::Active))
    {
        return Err(bad_request(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot change your own role or status",
        ));
    }

    if let Some(email) = update_data.email.as_mut() {
        *email = email.trim().to_lowercase();
        validate_email(email).map_err(|msg| bad_request(ErrorCode::UserEmailInvalid, msg))?;
    }

    if let Some(password) = update_data.password.take() {
        validate_password(&password)
            .map_err(|msg| bad_request(ErrorCode::UserPasswordInvalid, msg))?;
        update_data.password = Some(hashed_password(&password)?);
    }

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            UserResponse { user },
            "User information updated successfully",
        ))),
        Ok(None) => Err(not_found(ErrorCode::UserNotFound, "User not found")),
        Err(LmsError::Conflict(_)) => Err(reject(
            StatusCode::CONFLICT,
            ErrorCode::UserAlreadyExists,
            "Email already exists",
        )),
        Err(e) => Err(storage_failure("Failed to update user information")(e)),
    }
}
