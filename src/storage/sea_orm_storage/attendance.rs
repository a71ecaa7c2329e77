//! 考勤存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::attendance_records::{ActiveModel, Column, Entity as AttendanceRecords};
use crate::errors::Result;
use crate::models::attendance::{entities::AttendanceRecord, requests::AttendanceMark};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};

impl SeaOrmStorage {
    pub async fn list_attendance_records_impl(
        &self,
        class_id: i64,
        date: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let rows = AttendanceRecords::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::AttendanceDate.eq(date))
            .all(&self.db)
            .await
            .map_err(db_error("查询考勤失败"))?;

        Ok(rows.into_iter().map(|m| m.into_record()).collect())
    }

    /// 在同一事务中按 (班级, 日期, 学生) 写入或覆盖
    pub async fn upsert_attendance_records_impl(
        &self,
        class_id: i64,
        date: &str,
        marks: &[AttendanceMark],
        recorded_by: i64,
    ) -> Result<Vec<AttendanceRecord>> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        for mark in marks {
            let model = ActiveModel {
                class_id: Set(class_id),
                attendance_date: Set(date.to_string()),
                student_id: Set(mark.student_id),
                status: Set(mark.status.to_string()),
                recorded_by: Set(Some(recorded_by)),
                recorded_at: Set(now),
                ..Default::default()
            };

            AttendanceRecords::insert(model)
                .on_conflict(
                    OnConflict::columns([Column::ClassId, Column::AttendanceDate, Column::StudentId])
                        .update_columns([Column::Status, Column::RecordedBy, Column::RecordedAt])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .map_err(db_error("写入考勤失败"))?;
        }

        txn.commit().await.map_err(db_error("提交考勤失败"))?;

        self.list_attendance_records_impl(class_id, date).await
    }

    /// 学生在班级中的考勤历史，最近在前
    pub async fn list_student_attendance_impl(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<Vec<AttendanceRecord>> {
        let rows = AttendanceRecords::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::AttendanceDate)
            .all(&self.db)
            .await
            .map_err(db_error("查询考勤历史失败"))?;

        Ok(rows.into_iter().map(|m| m.into_record()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::entities::AttendanceStatus;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_class, seed_user};

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;

        let mark = |status| AttendanceMark {
            student_id: murid,
            status,
        };

        storage
            .upsert_attendance_records_impl(class_id, "2025-03-10", &[mark(AttendanceStatus::Sick)], guru)
            .await
            .unwrap();
        let records = storage
            .upsert_attendance_records_impl(
                class_id,
                "2025-03-10",
                &[mark(AttendanceStatus::Present)],
                guru,
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Present);
        assert_eq!(records[0].key(), format!("2025-03-10_{murid}"));

        storage
            .upsert_attendance_records_impl(class_id, "2025-03-11", &[mark(AttendanceStatus::Absent)], guru)
            .await
            .unwrap();
        let history = storage
            .list_student_attendance_impl(class_id, murid)
            .await
            .unwrap();
        let dates: Vec<_> = history.iter().map(|r| r.attendance_date.as_str()).collect();
        assert_eq!(dates, vec!["2025-03-11", "2025-03-10"]);
    }
}
