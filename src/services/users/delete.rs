use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, not_found, storage_failure};

pub async fn delete_user(
    service: &UserService,
    request: &HttpRequest,
    user_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if current_user(request)?.id == user_id {
        return Err(bad_request(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        ));
    }

    if !storage
        .delete_user(user_id)
        .await
        .map_err(storage_failure("User deletion failed"))?
    {
        return Err(not_found(ErrorCode::UserNotFound, "User not found"));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
}
