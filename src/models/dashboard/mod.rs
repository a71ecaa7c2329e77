use serde::Serialize;
use ts_rs::TS;

/// 仪表盘统计，按角色返回不同字段组
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "role", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum DashboardStats {
    Admin {
        admins: i64,
        gurus: i64,
        murids: i64,
        classes: i64,
        assignments: i64,
        exams: i64,
    },
    Guru {
        classes: i64,
        students: i64,
        assignments: i64,
        exams: i64,
        ungraded_submissions: i64,
    },
    Murid {
        classes: i64,
        pending_assignments: i64,
        pending_exams: i64,
    },
}
