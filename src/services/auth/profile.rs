use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::middlewares::require_jwt::{bearer_token, user_cache_key};
use crate::models::auth::requests::UpdateProfileRequest;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, not_found, reject, storage_failure};
use crate::services::users::hashed_password;
use crate::utils::password::verify_password;
use crate::utils::validate::{validate_password, validate_url};

use super::AuthService;

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let session_user = current_user(request)?;

    if let Some(url) = update_data.avatar_url.as_deref().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(|msg| bad_request(ErrorCode::BadRequest, msg))?;
    }

    // 修改密码需校验当前密码，缓存中的用户不含密码哈希，须重新读取
    let password = match update_data.new_password {
        Some(new_password) => {
            let stored = storage
                .get_user_by_id(session_user.id)
                .await
                .map_err(storage_failure("Load user"))?
                .ok_or_else(|| not_found(ErrorCode::UserNotFound, "User not found"))?;

            let current = update_data.current_password.unwrap_or_default();
            if !verify_password(&current, &stored.password_hash) {
                return Err(reject(
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::AuthFailed,
                    "Current password is incorrect",
                ));
            }
            validate_password(&new_password)
                .map_err(|msg| bad_request(ErrorCode::UserPasswordInvalid, msg))?;

            Some(hashed_password(&new_password)?)
        }
        None => None,
    };

    // 普通用户不能修改角色、状态与邮箱
    let storage_update = UpdateUserRequest {
        password,
        display_name: update_data.display_name,
        avatar_url: update_data.avatar_url,
        ..Default::default()
    };

    let user = storage
        .update_user(session_user.id, storage_update)
        .await
        .map_err(storage_failure("Update profile"))?
        .ok_or_else(|| not_found(ErrorCode::UserNotFound, "User not found"))?;

    // 缓存中的旧资料失效
    if let Some(token) = bearer_token(request.headers())
        && let Some(cache) = request.app_data::<web::Data<Arc<dyn ObjectCache>>>()
    {
        cache.remove(&user_cache_key(token)).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserResponse { user },
        "用户信息更新成功",
    )))
}
