use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::ClassService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{managed_class, not_found, storage_failure};

pub async fn delete_class(
    service: &ClassService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;

    if !storage
        .delete_class(access.class.id)
        .await
        .map_err(storage_failure("Class deletion failed"))?
    {
        return Err(not_found(ErrorCode::ClassNotFound, "Class not found"));
    }

    info!("Class {} deleted", access.class.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Class deleted successfully")))
}
