//! 学生作答流程
//!
//! 状态：loading → not_started | in_progress | submitted；
//! in_progress 只会因手动交卷、倒计时归零或检测到已有提交而进入 submitted。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use chrono::Utc;

use super::session::{SessionError, SessionKey, SessionSnapshot};
use super::{ExamService, load_exam, session_registry};
use crate::config::AppConfig;
use crate::models::exams::{
    entities::{ExamSubmission, SubmitTrigger},
    requests::SaveAnswerRequest,
    responses::ExamSessionResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, enrolled_student, not_found, reject, storage_failure};
use crate::storage::Storage;

fn in_progress(snapshot: SessionSnapshot) -> ExamSessionResponse {
    ExamSessionResponse::InProgress {
        remaining_seconds: snapshot.remaining_seconds(Utc::now()),
        ends_at: snapshot.ends_at,
        questions: snapshot.questions,
        answers: snapshot.answers,
    }
}

fn submitted(submission: ExamSubmission) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(
        ExamSessionResponse::Submitted { submission },
        "Exam submitted",
    ))
}

fn already_submitted() -> actix_web::Error {
    reject(
        StatusCode::CONFLICT,
        ErrorCode::ExamAlreadySubmitted,
        "Exam already submitted",
    )
}

fn submission_in_progress() -> actix_web::Error {
    reject(
        StatusCode::CONFLICT,
        ErrorCode::ExamAlreadySubmitted,
        "Exam submission is in progress",
    )
}

fn session_error(err: SessionError) -> actix_web::Error {
    match err {
        SessionError::NotFound => not_found(
            ErrorCode::ExamSessionNotFound,
            "No exam session in progress",
        ),
        SessionError::Submitting => submission_in_progress(),
        SessionError::TimeOver => bad_request(ErrorCode::ExamTimeOver, "Exam time is over"),
        SessionError::UnknownQuestion => not_found(
            ErrorCode::QuestionNotFound,
            "Question does not belong to this exam",
        ),
        SessionError::InvalidAnswer(msg) => bad_request(ErrorCode::AnswerInvalid, msg),
        SessionError::AlreadySubmitted => already_submitted(),
        SessionError::Storage(e) => storage_failure("Failed to save exam submission")(e),
    }
}

async fn stored_submission(
    storage: &dyn Storage,
    key: SessionKey,
) -> ActixResult<Option<ExamSubmission>> {
    storage
        .get_exam_submission(key.exam_id, key.student_id)
        .await
        .map_err(storage_failure("Failed to get exam submission"))
}

pub async fn open_session(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let registry = session_registry(request)?;
    let (access, student) = enrolled_student(request)?;
    let exam = load_exam(storage.as_ref(), access.class.id, exam_id).await?;
    let key = SessionKey::new(exam.id, student.id);

    if let Some(submission) = stored_submission(storage.as_ref(), key).await? {
        return Ok(submitted(submission));
    }

    let starts_at = exam.scheduled_start(AppConfig::get().exam.offset());
    if starts_at.is_none_or(|start| start > Utc::now()) {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(
            ExamSessionResponse::NotStarted { starts_at },
            "Exam has not started yet",
        )));
    }

    let snapshot = match registry.snapshot(key) {
        Some(snapshot) if snapshot.submitting => return Err(submission_in_progress()),
        Some(snapshot) => snapshot,
        None => {
            let questions = storage
                .list_questions(exam.id)
                .await
                .map_err(storage_failure("Failed to list questions"))?;
            if questions.is_empty() {
                return Err(bad_request(
                    ErrorCode::ExamInvalid,
                    "This exam has no questions yet",
                ));
            }
            let duration = exam.duration().to_std().unwrap_or_default();
            match registry.start(key, questions, duration) {
                Ok(snapshot) => snapshot,
                // 读取提交记录之后另一方刚好交卷
                Err(SessionError::AlreadySubmitted) => {
                    return match stored_submission(storage.as_ref(), key).await? {
                        Some(submission) => Ok(submitted(submission)),
                        None => Err(submission_in_progress()),
                    };
                }
                Err(err) => return Err(session_error(err)),
            }
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        in_progress(snapshot),
        "Exam in progress",
    )))
}

pub async fn save_answer(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    body: SaveAnswerRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let registry = session_registry(request)?;
    let (access, student) = enrolled_student(request)?;
    let exam = load_exam(storage.as_ref(), access.class.id, exam_id).await?;
    let key = SessionKey::new(exam.id, student.id);

    match registry.save_answer(key, body.question_id, body.answer) {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Answer saved"))),
        Err(SessionError::NotFound) => match stored_submission(storage.as_ref(), key).await? {
            Some(_) => Err(already_submitted()),
            None => Err(session_error(SessionError::NotFound)),
        },
        Err(err) => Err(session_error(err)),
    }
}

pub async fn submit(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let registry = session_registry(request)?;
    let (access, student) = enrolled_student(request)?;
    let exam = load_exam(storage.as_ref(), access.class.id, exam_id).await?;
    let key = SessionKey::new(exam.id, student.id);

    if let Some(submission) = registry
        .finish(key, SubmitTrigger::Manual)
        .await
        .map_err(session_error)?
    {
        return Ok(submitted(submission));
    }

    // 另一触发方已抢先提交
    match stored_submission(storage.as_ref(), key).await? {
        Some(submission) => Ok(submitted(submission)),
        None if registry.snapshot(key).is_some() => Err(submission_in_progress()),
        None => Err(session_error(SessionError::NotFound)),
    }
}
