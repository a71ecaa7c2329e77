//! 选课管理：班级成员列表、加入与移出

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use tracing::info;

use crate::errors::LmsError;
use crate::models::enrollments::{
    requests::EnrollStudentRequest,
    responses::{ClassMemberListResponse, EnrollmentResponse},
};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    bad_request, class_access, managed_class, not_found, reject, storage_failure,
};

super::define_service!(EnrollmentService);

impl EnrollmentService {
    pub async fn list_members(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = class_access(request)?;

        let items = storage
            .list_class_members(access.class.id)
            .await
            .map_err(storage_failure("Failed to list class members"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            ClassMemberListResponse { items },
            "Class members retrieved successfully",
        )))
    }

    pub async fn enroll_student(
        &self,
        request: &HttpRequest,
        body: EnrollStudentRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;

        let student = storage
            .get_user_by_id(body.student_id)
            .await
            .map_err(storage_failure("Failed to get student"))?
            .ok_or_else(|| not_found(ErrorCode::UserNotFound, "Student not found"))?;
        if student.role != UserRole::Murid {
            return Err(bad_request(
                ErrorCode::UserRoleInvalid,
                "Only murid users can be enrolled",
            ));
        }

        match storage.enroll_student(access.class.id, student.id).await {
            Ok(enrollment) => {
                info!("Student {} enrolled in class {}", student.id, access.class.id);
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    EnrollmentResponse { enrollment },
                    "Student enrolled successfully",
                )))
            }
            Err(LmsError::Conflict(_)) => Err(reject(
                StatusCode::CONFLICT,
                ErrorCode::AlreadyEnrolled,
                "Student is already enrolled in this class",
            )),
            Err(e) => Err(storage_failure("Enrollment failed")(e)),
        }
    }

    pub async fn remove_student(
        &self,
        request: &HttpRequest,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;

        if !storage
            .remove_enrollment(access.class.id, student_id)
            .await
            .map_err(storage_failure("Failed to remove student"))?
        {
            return Err(not_found(
                ErrorCode::EnrollmentNotFound,
                "Student is not enrolled in this class",
            ));
        }

        info!("Student {} removed from class {}", student_id, access.class.id);
        Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student removed successfully")))
    }
}
