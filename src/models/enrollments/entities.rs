use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 选课记录，每个学生在每个班级至多一条
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct Enrollment {
    pub id: i64,
    pub class_id: i64,
    pub student_id: i64,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// 班级成员（选课记录 + 学生信息）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct ClassMember {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}
