use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::info;

use super::{UserService, hashed_password};
use crate::errors::LmsError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::{bad_request, reject, storage_failure};
use crate::utils::validate::{validate_email, validate_password, validate_username};

pub async fn create_user(
    service: &UserService,
    request: &HttpRequest,
    mut user_data: CreateUserRequest,
) -> ActixResult<HttpResponse> {
    user_data.username = user_data.username.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();

    validate_username(&user_data.username)
        .map_err(|msg| bad_request(ErrorCode::UserNameInvalid, msg))?;
    validate_email(&user_data.email).map_err(|msg| bad_request(ErrorCode::UserEmailInvalid, msg))?;
    validate_password(&user_data.password)
        .map_err(|msg| bad_request(ErrorCode::UserPasswordInvalid, msg))?;

    user_data.password = hashed_password(&user_data.password)?;

    let storage = service.get_storage(request)?;

    match storage.create_user(user_data).await {
        Ok(user) => {
            info!("User {} created with role {}", user.username, user.role);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(UserResponse { user }, "User created successfully")))
        }
        Err(LmsError::Conflict(_)) => Err(reject(
            StatusCode::CONFLICT,
            ErrorCode::UserAlreadyExists,
            "Username or email already exists",
        )),
        Err(e) => Err(storage_failure("User creation failed")(e)),
    }
}
