use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::models::{
    ApiResponse,
    classes::requests::{ClassListQuery, ClassQueryParams},
    users::entities::UserRole,
};
use crate::services::{current_user, storage_failure};

pub async fn list_classes(
    service: &ClassService,
    request: &HttpRequest,
    query: ClassQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = current_user(request)?;

    // admin 看到全部，guru 仅自己负责的，murid 仅已选的
    let mut list_query = ClassListQuery {
        page: Some(query.pagination.page),
        size: Some(query.pagination.size),
        search: query.search,
        ..Default::default()
    };
    match user.role {
        UserRole::Admin => {}
        UserRole::Guru => list_query.teacher_id = Some(user.id),
        UserRole::Murid => list_query.student_id = Some(user.id),
    }

    let response = storage
        .list_classes_with_pagination(list_query)
        .await
        .map_err(storage_failure("Failed to retrieve class list"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Classes retrieved successfully",
    )))
}
