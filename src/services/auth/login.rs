use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse, responses::TOKEN_TYPE},
    users::entities::UserStatus,
};
use crate::services::{reject, storage_failure};
use crate::utils::jwt;
use crate::utils::password::verify_password;

use super::AuthService;

fn auth_failed() -> actix_web::Error {
    reject(
        StatusCode::UNAUTHORIZED,
        ErrorCode::AuthFailed,
        "Username or password is incorrect",
    )
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let config = service.get_config();

    // 1. 按用户名或邮箱查找用户
    let user = storage
        .get_user_by_username_or_email(login_request.username.trim())
        .await
        .map_err(storage_failure("Login failed"))?
        .ok_or_else(auth_failed)?;

    // 2. 验证密码
    if !verify_password(&login_request.password, &user.password_hash) {
        tracing::info!("Login rejected for {}: wrong password", user.username);
        return Err(auth_failed());
    }

    if user.status != UserStatus::Active {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            ErrorCode::AuthFailed,
            format!("Account is {}", user.status),
        ));
    }

    // 3. 更新最后登录时间
    if let Err(e) = storage.update_last_login(user.id).await {
        tracing::warn!("Failed to update last login for {}: {}", user.id, e);
    }

    // 4. 生成令牌对
    let remember = login_request
        .remember_me
        .then(|| chrono::Duration::days(config.jwt.refresh_token_remember_me_expiry));
    let token_pair = user.generate_token_pair(remember).map_err(|e| {
        tracing::error!("Failed to generate JWT token: {}", e);
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "Login failed, unable to generate token",
        )
    })?;

    tracing::info!("User {} logged in successfully", user.username);

    let refresh_cookie = jwt::JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token);
    let response = LoginResponse {
        access_token: token_pair.access_token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: config.jwt.access_token_expiry * 60,
        user,
    };

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}
