use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::ApiResponse;
use crate::models::classes::responses::ClassDetailResponse;
use crate::services::{class_access, storage_failure};

pub async fn get_class(service: &ClassService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = class_access(request)?;

    let teacher_name = storage
        .get_user_by_id(access.class.teacher_id)
        .await
        .map_err(storage_failure("Failed to get teacher"))?
        .map(|t| t.name().to_string());
    let student_count = storage
        .count_class_students(access.class.id)
        .await
        .map_err(storage_failure("Failed to count students"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ClassDetailResponse {
            class: access.class,
            teacher_name,
            student_count,
            relation: access.relation,
        },
        "Class information retrieved successfully",
    )))
}
