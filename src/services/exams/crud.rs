use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ExamService, load_exam, session_registry};
use crate::models::exams::{
    requests::{CreateExamRequest, UpdateExamRequest},
    responses::ExamListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, class_access, current_user, managed_class, not_found, storage_failure,
};
use crate::utils::validate::{validate_date, validate_required_text, validate_time, validate_url};

const TITLE_MAX: usize = 200;
/// 单场考试最长 24 小时
const DURATION_MAX_MINUTES: i32 = 24 * 60;

fn invalid(msg: impl Into<String>) -> actix_web::Error {
    bad_request(ErrorCode::ExamInvalid, msg)
}

/// 校验考试日程：日期、开始时间与正的时长
pub(crate) fn check_schedule(
    exam_date: &str,
    start_time: &str,
    duration_minutes: i32,
) -> Result<(), String> {
    validate_date(exam_date.trim()).map_err(str::to_string)?;
    validate_time(start_time.trim()).map_err(str::to_string)?;
    if !(1..=DURATION_MAX_MINUTES).contains(&duration_minutes) {
        return Err(format!(
            "Duration must be between 1 and {DURATION_MAX_MINUTES} minutes"
        ));
    }
    Ok(())
}

pub async fn list_exams(service: &ExamService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = class_access(request)?;

    let items = storage
        .list_exams(access.class.id)
        .await
        .map_err(storage_failure("Failed to list exams"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ExamListResponse { items },
        "Exams retrieved successfully",
    )))
}

pub async fn get_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = class_access(request)?;
    let exam = load_exam(storage.as_ref(), access.class.id, exam_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(exam, "Exam retrieved")))
}

pub async fn create_exam(
    service: &ExamService,
    request: &HttpRequest,
    mut body: CreateExamRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    let user = current_user(request)?;

    body.title = body.title.trim().to_string();
    body.exam_date = body.exam_date.trim().to_string();
    body.start_time = body.start_time.trim().to_string();
    validate_required_text(&body.title, TITLE_MAX).map_err(|msg| invalid(format!("title: {msg}")))?;
    check_schedule(&body.exam_date, &body.start_time, body.duration_minutes).map_err(invalid)?;
    if let Some(url) = body.question_file_url.as_deref().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(invalid)?;
    }

    let exam = storage
        .create_exam(access.class.id, user.id, body)
        .await
        .map_err(storage_failure("Exam creation failed"))?;

    info!("Exam {} created in class {} by {}", exam.id, access.class.id, user.id);
    Ok(HttpResponse::Created().json(ApiResponse::success(exam, "Exam created successfully")))
}

pub async fn update_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    mut body: UpdateExamRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    let current = load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    if let Some(title) = body.title.as_mut() {
        *title = title.trim().to_string();
        validate_required_text(title, TITLE_MAX).map_err(|msg| invalid(format!("title: {msg}")))?;
    }
    if let Some(date) = body.exam_date.as_mut() {
        *date = date.trim().to_string();
    }
    if let Some(time) = body.start_time.as_mut() {
        *time = time.trim().to_string();
    }
    check_schedule(
        body.exam_date.as_deref().unwrap_or(&current.exam_date),
        body.start_time.as_deref().unwrap_or(&current.start_time),
        body.duration_minutes.unwrap_or(current.duration_minutes),
    )
    .map_err(invalid)?;
    if let Some(url) = body.question_file_url.as_deref().filter(|u| !u.is_empty()) {
        validate_url(url).map_err(invalid)?;
    }

    let exam = storage
        .update_exam(exam_id, body)
        .await
        .map_err(storage_failure("Exam update failed"))?
        .ok_or_else(|| not_found(ErrorCode::ExamNotFound, "Exam not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(exam, "Exam updated successfully")))
}

pub async fn delete_exam(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    storage
        .delete_exam(exam_id)
        .await
        .map_err(storage_failure("Exam deletion failed"))?;
    session_registry(request)?.discard_exam(exam_id);

    info!("Exam {} deleted from class {}", exam_id, access.class.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Exam deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_schedule() {
        assert!(check_schedule("2025-05-02", "08:00", 90).is_ok());
        assert!(check_schedule("2025-05-02", "08:00", 0).is_err());
        assert!(check_schedule("2025-05-02", "08:00", -5).is_err());
        assert!(check_schedule("2025-05-02", "08:00", DURATION_MAX_MINUTES + 1).is_err());
        assert!(check_schedule("02-05-2025", "08:00", 90).is_err());
        assert!(check_schedule("2025-05-02", "8:00", 90).is_err());
        assert!(check_schedule("2025-05-02", "25:00", 90).is_err());
    }
}
