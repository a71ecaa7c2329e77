use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{ExamService, grading, load_exam};
use crate::models::exams::{
    requests::EssayScoreRequest,
    responses::{ExamSubmissionListResponse, MyExamSubmissionResponse},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, enrolled_student, managed_class, not_found, storage_failure};

pub async fn list_submissions(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    let items = storage
        .list_exam_submissions(exam_id)
        .await
        .map_err(storage_failure("Failed to list exam submissions"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        ExamSubmissionListResponse { items },
        "Exam submissions retrieved successfully",
    )))
}

/// 教师给问答题打分并重算最终成绩
pub async fn set_essay_score(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    student_id: i64,
    body: EssayScoreRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    if !(0..=100).contains(&body.essay_score) {
        return Err(bad_request(
            ErrorCode::GradeInvalid,
            "Essay score must be between 0 and 100",
        ));
    }

    let submission = storage
        .get_exam_submission(exam_id, student_id)
        .await
        .map_err(storage_failure("Failed to get exam submission"))?
        .ok_or_else(|| not_found(ErrorCode::ExamSubmissionNotFound, "Exam submission not found"))?;

    let essays = submission.essay_count();
    if essays == 0 {
        return Err(bad_request(
            ErrorCode::ExamInvalid,
            "This submission has no essay answers",
        ));
    }
    let final_grade = grading::final_grade(
        submission.score,
        Some(body.essay_score),
        submission.multiple_choice_count(),
        essays,
    );

    let updated = storage
        .set_exam_essay_score(exam_id, student_id, body.essay_score, final_grade)
        .await
        .map_err(storage_failure("Failed to save essay score"))?
        .ok_or_else(|| not_found(ErrorCode::ExamSubmissionNotFound, "Exam submission not found"))?;

    info!(
        "Essay score {} set for exam {} student {}, final grade {}",
        body.essay_score, exam_id, student_id, final_grade
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated, "Essay score saved")))
}

pub async fn my_submission(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let (access, student) = enrolled_student(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    let submission = storage
        .get_exam_submission(exam_id, student.id)
        .await
        .map_err(storage_failure("Failed to get exam submission"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        MyExamSubmissionResponse { submission },
        "Exam submission retrieved",
    )))
}
