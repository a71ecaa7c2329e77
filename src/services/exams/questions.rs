//! 题目维护，仅负责教师与管理员；学生只能在考试会话中看到不含答案的题目

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ExamService, load_exam};
use crate::models::exams::{
    entities::{ExamQuestion, QuestionType, validate_question},
    requests::{CreateQuestionRequest, UpdateQuestionRequest},
    responses::QuestionListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, managed_class, not_found, storage_failure};
use crate::storage::Storage;
use crate::utils::validate::validate_required_text;

const QUESTION_TEXT_MAX: usize = 5000;

fn invalid(msg: impl Into<String>) -> actix_web::Error {
    bad_request(ErrorCode::QuestionInvalid, msg)
}

fn trim_options(options: Vec<String>) -> Vec<String> {
    options.into_iter().map(|o| o.trim().to_string()).collect()
}

async fn load_question(
    storage: &dyn Storage,
    exam_id: i64,
    question_id: i64,
) -> ActixResult<ExamQuestion> {
    storage
        .get_question_by_id(question_id)
        .await
        .map_err(storage_failure("Failed to get question"))?
        .filter(|q| q.exam_id == exam_id)
        .ok_or_else(|| not_found(ErrorCode::QuestionNotFound, "Question not found"))
}

pub async fn list_questions(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    let items = storage
        .list_questions(exam_id)
        .await
        .map_err(storage_failure("Failed to list questions"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        QuestionListResponse { items },
        "Questions retrieved successfully",
    )))
}

pub async fn create_question(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    mut body: CreateQuestionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;

    body.question_text = body.question_text.trim().to_string();
    validate_required_text(&body.question_text, QUESTION_TEXT_MAX)
        .map_err(|msg| invalid(format!("question_text: {msg}")))?;
    body.options = trim_options(body.options);
    body.correct_option = body.correct_option.map(|c| c.trim().to_string());
    if body.question_type == QuestionType::Essay {
        body.correct_option = body.correct_option.filter(|c| !c.is_empty());
    }
    validate_question(body.question_type, &body.options, body.correct_option.as_deref())
        .map_err(invalid)?;

    let question = storage
        .create_question(exam_id, body)
        .await
        .map_err(storage_failure("Question creation failed"))?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        question,
        "Question created successfully",
    )))
}

pub async fn update_question(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    question_id: i64,
    mut body: UpdateQuestionRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;
    let current = load_question(storage.as_ref(), exam_id, question_id).await?;

    if let Some(text) = body.question_text.as_mut() {
        *text = text.trim().to_string();
        validate_required_text(text, QUESTION_TEXT_MAX)
            .map_err(|msg| invalid(format!("question_text: {msg}")))?;
    }
    body.options = body.options.map(trim_options);
    body.correct_option = body.correct_option.map(|c| c.trim().to_string());

    // 合并后整体校验，题型不可修改
    let options = body.options.as_ref().unwrap_or(&current.options);
    let correct = body
        .correct_option
        .as_deref()
        .or(current.correct_option.as_deref());
    validate_question(current.question_type, options, correct).map_err(invalid)?;

    let question = storage
        .update_question(question_id, body)
        .await
        .map_err(storage_failure("Question update failed"))?
        .ok_or_else(|| not_found(ErrorCode::QuestionNotFound, "Question not found"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        question,
        "Question updated successfully",
    )))
}

pub async fn delete_question(
    service: &ExamService,
    request: &HttpRequest,
    exam_id: i64,
    question_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let access = managed_class(request)?;
    load_exam(storage.as_ref(), access.class.id, exam_id).await?;
    load_question(storage.as_ref(), exam_id, question_id).await?;

    storage
        .delete_question(question_id)
        .await
        .map_err(storage_failure("Question deletion failed"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Question deleted successfully")))
}
