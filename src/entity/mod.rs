//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod announcements;
pub mod assignment_submissions;
pub mod assignments;
pub mod attendance_records;
pub mod classes;
pub mod enrollments;
pub mod exam_questions;
pub mod exam_submissions;
pub mod exams;
pub mod files;
pub mod materials;
pub mod mentors;
pub mod settings;
pub mod users;

use chrono::{DateTime, Utc};

/// 数据库中的 unix 秒转换为 UTC 时间
pub(crate) fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}
