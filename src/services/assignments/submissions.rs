use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{AssignmentService, load_assignment};
use crate::models::assignments::{
    entities::SubmissionStatus,
    requests::{GradeSubmissionRequest, SubmitAssignmentRequest},
    responses::{MySubmissionResponse, SubmissionListResponse},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, current_user, enrolled_student, managed_class, not_found, storage_failure,
};
use crate::utils::validate::validate_url;

const COMMENT_MAX: usize = 2000;

/// 成绩须为 0..=100 的有限数
pub(crate) fn validate_grade(grade: f64) -> Result<(), &'static str> {
    if grade.is_finite() && (0.0..=100.0).contains(&grade) {
        Ok(())
    } else {
        Err("Grade must be between 0 and 100")
    }
}

pub async fn submit(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    body: SubmitAssignmentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let (access, student) = enrolled_student(request)?;
    let assignment = load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;

    let file_url = body.file_url.trim().to_string();
    if file_url.is_empty() {
        return Err(bad_request(ErrorCode::BadRequest, "file_url is required"));
    }
    validate_url(&file_url).map_err(|msg| bad_request(ErrorCode::BadRequest, msg))?;

    let status = SubmissionStatus::for_submission(chrono::Utc::now(), assignment.deadline);
    let submission = storage
        .upsert_assignment_submission(assignment.id, student.id, file_url, status)
        .await
        .map_err(storage_failure("Submission failed"))?;

    info!(
        "Student {} submitted assignment {} ({})",
        student.id, assignment.id, submission.status
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        submission,
        "Assignment submitted successfully",
    )))
}

pub async fn my_submission(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let (access, student) = enrolled_student(request)?;
    load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;

    let submission = storage
        .get_student_assignment_submission(assignment_id, student.id)
        .await
        .map_err(storage_failure("Failed to get submission"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MySubmissionResponse { submission },
        "Submission retrieved",
    )))
}

pub async fn list_submissions(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;

    let items = storage
        .list_assignment_submissions(assignment_id)
        .await
        .map_err(storage_failure("Failed to list submissions"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SubmissionListResponse { items },
        "Submissions retrieved successfully",
    )))
}

pub async fn grade(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    submission_id: i64,
    body: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    let grader = current_user(request)?;
    load_assignment(storage.as_ref(), access.class.id, assignment_id).await?;

    validate_grade(body.grade).map_err(|msg| bad_request(ErrorCode::GradeInvalid, msg))?;
    let comment = body
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    if comment.as_ref().is_some_and(|c| c.chars().count() > COMMENT_MAX) {
        return Err(bad_request(
            ErrorCode::GradeInvalid,
            format!("Comment must be at most {COMMENT_MAX} characters"),
        ));
    }

    // 提交须属于该作业
    storage
        .get_assignment_submission_by_id(submission_id)
        .await
        .map_err(storage_failure("Failed to get submission"))?
        .filter(|s| s.assignment_id == assignment_id)
        .ok_or_else(|| not_found(ErrorCode::SubmissionNotFound, "Submission not found"))?;

    let submission = storage
        .grade_assignment_submission(submission_id, body.grade, comment, grader.id)
        .await
        .map_err(storage_failure("Grading failed"))?
        .ok_or_else(|| not_found(ErrorCode::SubmissionNotFound, "Submission not found"))?;

    info!("Submission {} graded {} by {}", submission_id, body.grade, grader.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission graded")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_grade() {
        assert!(validate_grade(0.0).is_ok());
        assert!(validate_grade(100.0).is_ok());
        assert!(validate_grade(87.5).is_ok());
        assert!(validate_grade(-1.0).is_err());
        assert!(validate_grade(100.5).is_err());
        assert!(validate_grade(f64::NAN).is_err());
    }
}
