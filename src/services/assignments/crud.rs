use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{AssignmentService, load_assignment};
use crate::models::assignments::{
    requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
    responses::AssignmentListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, class_access, current_user, managed_class, not_found, storage_failure,
};
use crate::utils::validate::{validate_required_text, validate_url};

const TITLE_MAX: usize = 200;

fn check_urls(urls: &[Option<&str>]) -> ActixResult<()> {
    for url in urls.iter().flatten().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(|msg| bad_request(ErrorCode::BadRequest, msg))?;
    }
    Ok(())
}

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = class_access(request)?;

    let items = storage
        .list_assignments(access.class.id)
        .await
        .map_err(storage_failure("Failed to list assignments"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AssignmentListResponse { items },
        "Assignments retrieved successfully",
    )))
}

pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = class_access(request)?;
    let assignment = load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "Assignment retrieved")))
}

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    mut body: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    let user = current_user(request)?;

    body.title = body.title.trim().to_string();
    validate_required_text(&body.title, TITLE_MAX)
        .map_err(|msg| bad_request(ErrorCode::BadRequest, format!("title: {msg}")))?;
    check_urls(&[
        body.task_file_url.as_deref(),
        body.video_url.as_deref(),
        body.cover_url.as_deref(),
    ])?;

    let assignment = storage
        .create_assignment(access.class.id, user.id, body)
        .await
        .map_err(storage_failure("Assignment creation failed"))?;

    tracing::info!(
        "Assignment {} created in class {} by {}",
        assignment.id,
        access.class.id,
        user.id
    );
    Ok(HttpResponse::Created().json(ApiResponse::success(
        assignment,
        "Assignment created successfully",
    )))
}

pub async fn update_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    mut body: UpdateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;

    if let Some(title) = body.title.as_mut() {
        *title = title.trim().to_string();
        validate_required_text(title, TITLE_MAX)
            .map_err(|msg| bad_request(ErrorCode::BadRequest, format!("title: {msg}")))?;
    }
    check_urls(&[
        body.task_file_url.as_deref(),
        body.video_url.as_deref(),
        body.cover_url.as_deref(),
    ])?;

    let assignment = storage
        .update_assignment(assignment_id, body)
        .await
        .map_err(storage_failure("Assignment update failed"))?
        .ok_or_else(|| not_found(ErrorCode::AssignmentNotFound, "Assignment not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        assignment,
        "Assignment updated successfully",
    )))
}

pub async fn delete_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;

    storage
        .delete_assignment(assignment_id)
        .await
        .map_err(storage_failure("Assignment deletion failed"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Assignment deleted successfully")))
}
