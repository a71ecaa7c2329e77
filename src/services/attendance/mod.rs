//! 考勤（absensi）
//!
//! 某日考勤表以班级已选课学生为准，无记录的学生显示为 `not_yet`。

use std::collections::{HashMap, HashSet};

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::config::AppConfig;
use crate::models::attendance::{
    entities::{AttendanceEntry, AttendanceRecord, AttendanceStatus},
    requests::{AttendanceDateQuery, AttendanceMark, RecordAttendanceRequest},
    responses::{AttendanceHistoryResponse, AttendanceSheetResponse},
};
use crate::models::enrollments::entities::ClassMember;
use crate::models::exams::entities::EXAM_DATE_FORMAT;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, enrolled_student, managed_class, storage_failure};
use crate::utils::validate::validate_date;

super::define_service!(AttendanceService);

/// 按学校时区的今天
fn today() -> String {
    chrono::Utc::now()
        .with_timezone(&AppConfig::get().exam.offset())
        .format(EXAM_DATE_FORMAT)
        .to_string()
}

fn normalize_date(date: &str) -> ActixResult<String> {
    validate_date(date.trim())
        .map(|d| d.format(EXAM_DATE_FORMAT).to_string())
        .map_err(|msg| bad_request(ErrorCode::AttendanceInvalid, msg))
}

/// 合并选课名单与当日记录
pub(crate) fn build_sheet(
    members: &[ClassMember],
    records: &[AttendanceRecord],
) -> Vec<AttendanceEntry> {
    let by_student: HashMap<i64, &AttendanceRecord> =
        records.iter().map(|r| (r.student_id, r)).collect();

    members
        .iter()
        .map(|m| {
            let record = by_student.get(&m.student_id);
            AttendanceEntry {
                student_id: m.student_id,
                student_name: m.display_name.clone().unwrap_or_else(|| m.username.clone()),
                status: record.map(|r| r.status).unwrap_or_default(),
                recorded_at: record.map(|r| r.recorded_at),
            }
        })
        .collect()
}

/// 校验待写入的标记：非空，且只能包含已选课学生；同一学生以最后一条为准
pub(crate) fn check_marks(
    marks: Vec<AttendanceMark>,
    enrolled: &HashSet<i64>,
) -> Result<Vec<AttendanceMark>, String> {
    if marks.is_empty() {
        return Err("records must not be empty".to_string());
    }
    if let Some(stranger) = marks.iter().find(|m| !enrolled.contains(&m.student_id)) {
        return Err(format!(
            "Student {} is not enrolled in this class",
            stranger.student_id
        ));
    }

    let mut seen = HashSet::new();
    let mut deduped: Vec<AttendanceMark> = marks
        .into_iter()
        .rev()
        .filter(|m| seen.insert(m.student_id))
        .collect();
    deduped.reverse();
    Ok(deduped)
}

impl AttendanceService {
    pub async fn get_sheet(
        &self,
        request: &HttpRequest,
        query: AttendanceDateQuery,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        let date = match query.date.as_deref() {
            Some(d) => normalize_date(d)?,
            None => today(),
        };

        let members = storage
            .list_class_members(access.class.id)
            .await
            .map_err(storage_failure("Failed to list members"))?;
        let records = storage
            .list_attendance_records(access.class.id, &date)
            .await
            .map_err(storage_failure("Failed to list attendance"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            AttendanceSheetResponse {
                items: build_sheet(&members, &records),
                date,
            },
            "Attendance retrieved successfully",
        )))
    }

    pub async fn record(
        &self,
        request: &HttpRequest,
        body: RecordAttendanceRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let access = managed_class(request)?;
        let user = current_user(request)?;
        let date = normalize_date(&body.date)?;

        let enrolled: HashSet<i64> = storage
            .list_class_members(access.class.id)
            .await
            .map_err(storage_failure("Failed to list members"))?
            .into_iter()
            .map(|m| m.student_id)
            .collect();
        let marks = check_marks(body.records, &enrolled)
            .map_err(|msg| bad_request(ErrorCode::AttendanceInvalid, msg))?;

        let items = storage
            .upsert_attendance_records(access.class.id, &date, &marks, user.id)
            .await
            .map_err(storage_failure("Failed to record attendance"))?;

        info!(
            "Attendance for class {} on {} recorded by {} ({} students)",
            access.class.id,
            date,
            user.id,
            items.len()
        );
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            AttendanceHistoryResponse { items },
            "Attendance recorded successfully",
        )))
    }

    // 学生本人在该班级的考勤记录
    pub async fn my_history(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let (access, student) = enrolled_student(request)?;

        let items = storage
            .list_student_attendance(access.class.id, student.id)
            .await
            .map_err(storage_failure("Failed to list attendance"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            AttendanceHistoryResponse { items },
            "Attendance retrieved successfully",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn member(student_id: i64, name: Option<&str>) -> ClassMember {
        ClassMember {
            enrollment_id: student_id * 10,
            student_id,
            username: format!("murid{student_id}"),
            email: format!("murid{student_id}@kelas.id"),
            display_name: name.map(str::to_string),
            avatar_url: None,
            enrolled_at: Utc::now(),
        }
    }

    fn mark(student_id: i64, status: AttendanceStatus) -> AttendanceMark {
        AttendanceMark { student_id, status }
    }

    #[test]
    fn test_sheet_defaults_to_not_yet() {
        let members = vec![member(1, Some("Andi")), member(2, None)];
        let records = vec![AttendanceRecord {
            id: 7,
            class_id: 1,
            attendance_date: "2025-03-10".into(),
            student_id: 2,
            status: AttendanceStatus::Sick,
            recorded_by: Some(9),
            recorded_at: Utc::now(),
        }];

        let sheet = build_sheet(&members, &records);
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet[0].student_name, "Andi");
        assert_eq!(sheet[0].status, AttendanceStatus::NotYet);
        assert!(sheet[0].recorded_at.is_none());
        assert_eq!(sheet[1].student_name, "murid2");
        assert_eq!(sheet[1].status, AttendanceStatus::Sick);
    }

    #[test]
    fn test_marks_only_for_enrolled_students() {
        let enrolled: HashSet<i64> = [1, 2].into_iter().collect();
        assert!(check_marks(vec![], &enrolled).is_err());
        assert!(check_marks(vec![mark(3, AttendanceStatus::Present)], &enrolled).is_err());

        let marks = check_marks(
            vec![
                mark(1, AttendanceStatus::Present),
                mark(2, AttendanceStatus::Absent),
                mark(1, AttendanceStatus::Excused),
            ],
            &enrolled,
        )
        .unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].student_id, 2);
        assert_eq!(marks[1].status, AttendanceStatus::Excused);
    }

    #[test]
    fn test_normalize_date() {
        assert_eq!(normalize_date(" 2025-03-10 ").unwrap(), "2025-03-10");
        assert!(normalize_date("10-03-2025").is_err());
    }
}
