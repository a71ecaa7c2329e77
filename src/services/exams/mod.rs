//! 考试（ujian）、题目（soal）与限时作答
//!
//! 教师维护考试与题目；学生在计划开始时间之后开考，倒计时结束或手动交卷时自动评分。

pub mod crud;
pub mod grading;
pub mod questions;
pub mod session;
pub mod submissions;
pub mod taking;

pub use session::{ExamSessionRegistry, SessionKey};

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use tracing::error;

use crate::models::ErrorCode;
use crate::models::exams::entities::Exam;
use crate::models::exams::requests::{
    CreateExamRequest, CreateQuestionRequest, EssayScoreRequest, SaveAnswerRequest,
    UpdateExamRequest, UpdateQuestionRequest,
};
use crate::services::{not_found, reject, storage_failure};
use crate::storage::Storage;

super::define_service!(ExamService);

pub(crate) async fn load_exam(
    storage: &dyn Storage,
    class_id: i64,
    exam_id: i64,
) -> ActixResult<Exam> {
    storage
        .get_exam_by_id(exam_id)
        .await
        .map_err(storage_failure("Failed to get exam"))?
        .filter(|e| e.class_id == class_id)
        .ok_or_else(|| not_found(ErrorCode::ExamNotFound, "Exam not found"))
}

/// 启动时注册到 app data 的会话表
pub(crate) fn session_registry(request: &HttpRequest) -> ActixResult<Arc<ExamSessionRegistry>> {
    request
        .app_data::<web::Data<Arc<ExamSessionRegistry>>>()
        .map(|r| r.get_ref().clone())
        .ok_or_else(|| {
            error!("Exam session registry not found in app data");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Exam sessions unavailable",
            )
        })
}

impl ExamService {
    pub async fn list_exams(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        crud::list_exams(self, request).await
    }

    pub async fn get_exam(&self, request: &HttpRequest, exam_id: i64) -> ActixResult<HttpResponse> {
        crud::get_exam(self, request, exam_id).await
    }

    pub async fn create_exam(
        &self,
        request: &HttpRequest,
        body: CreateExamRequest,
    ) -> ActixResult<HttpResponse> {
        crud::create_exam(self, request, body).await
    }

    pub async fn update_exam(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        body: UpdateExamRequest,
    ) -> ActixResult<HttpResponse> {
        crud::update_exam(self, request, exam_id, body).await
    }

    pub async fn delete_exam(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        crud::delete_exam(self, request, exam_id).await
    }

    pub async fn list_questions(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        questions::list_questions(self, request, exam_id).await
    }

    pub async fn create_question(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        body: CreateQuestionRequest,
    ) -> ActixResult<HttpResponse> {
        questions::create_question(self, request, exam_id, body).await
    }

    pub async fn update_question(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        question_id: i64,
        body: UpdateQuestionRequest,
    ) -> ActixResult<HttpResponse> {
        questions::update_question(self, request, exam_id, question_id, body).await
    }

    pub async fn delete_question(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        question_id: i64,
    ) -> ActixResult<HttpResponse> {
        questions::delete_question(self, request, exam_id, question_id).await
    }

    /// 打开或恢复考试会话
    pub async fn open_session(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        taking::open_session(self, request, exam_id).await
    }

    pub async fn save_answer(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        body: SaveAnswerRequest,
    ) -> ActixResult<HttpResponse> {
        taking::save_answer(self, request, exam_id, body).await
    }

    pub async fn submit(&self, request: &HttpRequest, exam_id: i64) -> ActixResult<HttpResponse> {
        taking::submit(self, request, exam_id).await
    }

    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::list_submissions(self, request, exam_id).await
    }

    pub async fn set_essay_score(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        student_id: i64,
        body: EssayScoreRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::set_essay_score(self, request, exam_id, student_id, body).await
    }

    pub async fn my_submission(
        &self,
        request: &HttpRequest,
        exam_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::my_submission(self, request, exam_id).await
    }
}
