use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 考勤状态，无记录时视为 `not_yet`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub enum AttendanceStatus {
    #[default]
    NotYet,
    Present,
    Sick,
    Excused,
    Absent,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AttendanceStatus::NotYet => "not_yet",
            AttendanceStatus::Present => "present",
            AttendanceStatus::Sick => "sick",
            AttendanceStatus::Excused => "excused",
            AttendanceStatus::Absent => "absent",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_yet" => Ok(AttendanceStatus::NotYet),
            "present" => Ok(AttendanceStatus::Present),
            "sick" => Ok(AttendanceStatus::Sick),
            "excused" => Ok(AttendanceStatus::Excused),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(format!("Invalid attendance status: {s}")),
        }
    }
}

/// 考勤记录，按 (班级, 日期, 学生) 唯一
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceRecord {
    pub id: i64,
    pub class_id: i64,
    /// YYYY-MM-DD
    pub attendance_date: String,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub recorded_by: Option<i64>,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

impl AttendanceRecord {
    /// 班级内的逻辑键 `date_studentId`
    pub fn key(&self) -> String {
        format!("{}_{}", self.attendance_date, self.student_id)
    }
}

/// 某日考勤表中的一行
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/attendance.ts")]
pub struct AttendanceEntry {
    pub student_id: i64,
    pub student_name: String,
    pub status: AttendanceStatus,
    pub recorded_at: Option<chrono::DateTime<chrono::Utc>>,
}
