use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 班级（kelas）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    // 负责教师（guru）ID
    pub teacher_id: i64,
    pub cover_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 当前用户与班级的关系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/class.ts")]
pub enum ClassRelation {
    /// 管理员，可管理任意班级
    Admin,
    /// 班级负责教师
    Owner,
    /// 已选课学生
    Member,
}

impl ClassRelation {
    /// 能否管理班级内容（资料、作业、考试、考勤、公告）
    pub fn can_manage(&self) -> bool {
        matches!(self, ClassRelation::Admin | ClassRelation::Owner)
    }
}

/// 已通过权限校验的班级访问上下文
#[derive(Debug, Clone)]
pub struct ClassAccess {
    pub class: Class,
    pub relation: ClassRelation,
}
