pub mod crud;
pub mod submissions;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::ErrorCode;
use crate::models::assignments::entities::Assignment;
use crate::models::assignments::requests::{
    CreateAssignmentRequest, GradeSubmissionRequest, SubmitAssignmentRequest,
    UpdateAssignmentRequest,
};
use crate::services::{not_found, storage_failure};
use crate::storage::Storage;

super::define_service!(
    /// 作业（tugas）与作业提交
    AssignmentService
);

/// 读取作业并确认属于当前班级
pub(crate) async fn load_assignment(
    storage: &dyn Storage,
    class_id: i64,
    assignment_id: i64,
) -> ActixResult<Assignment> {
    storage
        .get_assignment_by_id(assignment_id)
        .await
        .map_err(storage_failure("Failed to get assignment"))?
        .filter(|a| a.class_id == class_id)
        .ok_or_else(|| not_found(ErrorCode::AssignmentNotFound, "Assignment not found"))
}

impl AssignmentService {
    pub async fn list_assignments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        crud::list_assignments(self, request).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        crud::get_assignment(self, request, assignment_id).await
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        body: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        crud::create_assignment(self, request, body).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        body: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        crud::update_assignment(self, request, assignment_id, body).await
    }

    pub async fn delete_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        crud::delete_assignment(self, request, assignment_id).await
    }

    // 学生提交或重新提交
    pub async fn submit(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        body: SubmitAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::submit(self, request, assignment_id, body).await
    }

    pub async fn my_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::my_submission(self, request, assignment_id).await
    }

    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        submissions::list_submissions(self, request, assignment_id).await
    }

    pub async fn grade_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        submission_id: i64,
        body: GradeSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::grade(self, request, assignment_id, submission_id, body).await
    }
}
