//! API 数据模型
//!
//! 每个业务域分为 entities（业务实体）、requests（请求体/查询参数）与 responses（响应体）。

pub mod announcements;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod common;
pub mod dashboard;
pub mod enrollments;
pub mod exams;
pub mod files;
pub mod materials;
pub mod mentors;
pub mod settings;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码，随 ApiResponse.code 返回给前端
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,

    // 认证与用户
    AuthFailed = 2000,
    UserNotFound = 2001,
    UserAlreadyExists = 2002,
    UserNameInvalid = 2003,
    UserEmailInvalid = 2004,
    UserPasswordInvalid = 2005,
    CanNotDeleteCurrentUser = 2006,
    UserRoleInvalid = 2007,

    // 班级与选课
    ClassNotFound = 3000,
    ClassPermissionDenied = 3001,
    AlreadyEnrolled = 3002,
    EnrollmentNotFound = 3003,
    NotEnrolled = 3004,

    // 学习资料
    MaterialNotFound = 4000,
    MaterialInvalid = 4001,

    // 作业
    AssignmentNotFound = 5000,
    SubmissionNotFound = 5001,
    GradeInvalid = 5002,

    // 考试
    ExamNotFound = 6000,
    QuestionNotFound = 6001,
    QuestionInvalid = 6002,
    ExamSessionNotFound = 6004,
    ExamTimeOver = 6005,
    ExamAlreadySubmitted = 6006,
    AnswerInvalid = 6007,
    ExamSubmissionNotFound = 6008,
    ExamInvalid = 6009,

    // 考勤、公告、导师、站点设置
    AttendanceInvalid = 7000,
    AnnouncementNotFound = 7100,
    MentorNotFound = 7200,
    SettingInvalid = 7301,

    // 文件
    FileNotFound = 8000,
    FileUploadFailed = 8001,
    FileTypeNotAllowed = 8002,
    FileSizeExceeded = 8003,
    MultifileUploadNotAllowed = 8004,
}
