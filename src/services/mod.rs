pub mod access;
pub mod announcements;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod enrollments;
pub mod exams;
pub mod files;
pub mod materials;
pub mod mentors;
pub mod settings;
pub mod users;

pub use announcements::AnnouncementService;
pub use assignments::AssignmentService;
pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use classes::ClassService;
pub use dashboard::DashboardService;
pub use enrollments::EnrollmentService;
pub use exams::{ExamService, ExamSessionRegistry};
pub use files::FileService;
pub use materials::MaterialService;
pub use mentors::MentorService;
pub use settings::{DynamicConfig, SettingService};
pub use users::UserService;

use actix_web::{
    HttpMessage, HttpRequest, Result as ActixResult, error::InternalError, http::StatusCode, web,
};
use std::sync::Arc;
use tracing::error;

use crate::errors::LmsError;
use crate::middlewares::RequireJWT;
use crate::models::classes::entities::ClassAccess;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 定义持有存储句柄的服务结构体
///
/// 生成 `new_lazy()` 与 `get_storage()`，存储未注入时从 app data 获取。
macro_rules! define_service {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            storage: Option<std::sync::Arc<dyn $crate::storage::Storage>>,
        }

        impl $name {
            pub fn new_lazy() -> Self {
                Self { storage: None }
            }

            pub(crate) fn get_storage(
                &self,
                request: &actix_web::HttpRequest,
            ) -> actix_web::Result<std::sync::Arc<dyn $crate::storage::Storage>> {
                match &self.storage {
                    Some(storage) => Ok(storage.clone()),
                    None => $crate::services::app_storage(request),
                }
            }
        }
    };
}
pub(crate) use define_service;

/// 构造带统一响应体的错误，处理程序中可直接用 `?` 返回
pub(crate) fn reject(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
) -> actix_web::Error {
    let message = message.into();
    let response = ApiResponse::respond(status, code, &message);
    InternalError::from_response(message, response).into()
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> actix_web::Error {
    reject(StatusCode::NOT_FOUND, code, message)
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> actix_web::Error {
    reject(StatusCode::BAD_REQUEST, code, message)
}

pub(crate) fn forbidden(code: ErrorCode, message: impl Into<String>) -> actix_web::Error {
    reject(StatusCode::FORBIDDEN, code, message)
}

/// 存储层错误到 HTTP 错误的映射
pub(crate) fn storage_failure(context: &'static str) -> impl FnOnce(LmsError) -> actix_web::Error {
    move |err| match err {
        LmsError::Conflict(_) => reject(
            StatusCode::CONFLICT,
            ErrorCode::Conflict,
            format!("{context}: resource already exists"),
        ),
        LmsError::NotFound(msg) => not_found(ErrorCode::NotFound, format!("{context}: {msg}")),
        LmsError::Validation(msg) => bad_request(ErrorCode::BadRequest, format!("{context}: {msg}")),
        other => {
            error!("{}: {}", context, other);
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                format!("{context}: {}", other.message()),
            )
        }
    }
}

pub(crate) fn app_storage(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or_else(|| {
            error!("Storage not found in app data");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Storage unavailable",
            )
        })
}

/// 当前登录用户，须在 RequireJWT 之后使用
pub(crate) fn current_user(request: &HttpRequest) -> ActixResult<User> {
    RequireJWT::extract_user_claims(request).ok_or_else(|| {
        reject(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )
    })
}

/// 已校验的班级访问上下文，须在 RequireClassAccess 之后使用
pub(crate) fn class_access(request: &HttpRequest) -> ActixResult<ClassAccess> {
    request
        .extensions()
        .get::<ClassAccess>()
        .cloned()
        .ok_or_else(|| {
            forbidden(
                ErrorCode::ClassPermissionDenied,
                "No permission for this class",
            )
        })
}

/// 需要管理权限（负责教师或管理员）的班级访问上下文
pub(crate) fn managed_class(request: &HttpRequest) -> ActixResult<ClassAccess> {
    let access = class_access(request)?;
    if access.relation.can_manage() {
        Ok(access)
    } else {
        Err(forbidden(
            ErrorCode::ClassPermissionDenied,
            "Only the class teacher or an admin can do this",
        ))
    }
}

/// 班级内的学生上下文：已选课的 murid
pub(crate) fn enrolled_student(request: &HttpRequest) -> ActixResult<(ClassAccess, User)> {
    let access = class_access(request)?;
    let user = current_user(request)?;
    if access.relation == crate::models::classes::entities::ClassRelation::Member {
        Ok((access, user))
    } else {
        Err(forbidden(
            ErrorCode::NotEnrolled,
            "Only enrolled students can do this",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_storage_failure_mapping() {
        let err = storage_failure("Enroll student")(LmsError::conflict("dup"));
        assert_eq!(err.as_response_error().status_code(), StatusCode::CONFLICT);

        let err = storage_failure("Load class")(LmsError::database_operation("boom"));
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let err = storage_failure("Save")(LmsError::validation("bad"));
        assert_eq!(err.as_response_error().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_reject_carries_status() {
        let err = not_found(ErrorCode::ExamNotFound, "missing");
        assert_eq!(err.as_response_error().status_code(), StatusCode::NOT_FOUND);
        let _ = err.error_response();
    }
}
