//! 作业与作业提交存储操作

use super::{SeaOrmStorage, db_error, student_name};
use crate::entity::assignment_submissions::{
    self, ActiveModel as SubmissionActiveModel, Entity as AssignmentSubmissions,
};
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::{classes, enrollments, users::Entity as Users};
use crate::errors::Result;
use crate::models::assignments::{
    entities::{Assignment, AssignmentSubmission, SubmissionStatus},
    requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
    responses::SubmissionWithStudent,
};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};

impl SeaOrmStorage {
    pub async fn create_assignment_impl(
        &self,
        class_id: i64,
        created_by: i64,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(class_id),
            title: Set(req.title),
            description: Set(req.description),
            deadline: Set(req.deadline.timestamp()),
            task_file_url: Set(req.task_file_url),
            video_url: Set(req.video_url),
            cover_url: Set(req.cover_url),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建作业失败"))?;

        Ok(result.into_assignment())
    }

    pub async fn get_assignment_by_id_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询作业失败"))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 班级作业，按截止时间排序
    pub async fn list_assignments_impl(&self, class_id: i64) -> Result<Vec<Assignment>> {
        let rows = Assignments::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::Deadline)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询作业列表失败"))?;

        Ok(rows.into_iter().map(|m| m.into_assignment()).collect())
    }

    pub async fn update_assignment_impl(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        if self.get_assignment_by_id_impl(assignment_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(assignment_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(deadline) = update.deadline {
            model.deadline = Set(deadline.timestamp());
        }
        if let Some(task_file_url) = update.task_file_url {
            model.task_file_url = Set(Some(task_file_url));
        }
        if let Some(video_url) = update.video_url {
            model.video_url = Set(Some(video_url));
        }
        if let Some(cover_url) = update.cover_url {
            model.cover_url = Set(Some(cover_url));
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新作业失败"))?;

        Ok(Some(updated.into_assignment()))
    }

    pub async fn delete_assignment_impl(&self, assignment_id: i64) -> Result<bool> {
        let result = Assignments::delete_by_id(assignment_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除作业失败"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_assignments_impl(&self, teacher_id: Option<i64>) -> Result<i64> {
        let mut select = Assignments::find();
        if let Some(teacher_id) = teacher_id {
            select = select.filter(
                Column::ClassId.in_subquery(
                    Query::select()
                        .column(classes::Column::Id)
                        .from(classes::Entity)
                        .and_where(classes::Column::TeacherId.eq(teacher_id))
                        .to_owned(),
                ),
            );
        }

        let count = select
            .count(&self.db)
            .await
            .map_err(db_error("统计作业数量失败"))?;

        Ok(count as i64)
    }

    /// 已选班级中尚未提交的作业数
    pub async fn count_pending_assignments_impl(&self, student_id: i64) -> Result<i64> {
        let count = Assignments::find()
            .filter(
                Column::ClassId.in_subquery(
                    Query::select()
                        .column(enrollments::Column::ClassId)
                        .from(enrollments::Entity)
                        .and_where(enrollments::Column::StudentId.eq(student_id))
                        .to_owned(),
                ),
            )
            .filter(
                Column::Id.not_in_subquery(
                    Query::select()
                        .column(assignment_submissions::Column::AssignmentId)
                        .from(assignment_submissions::Entity)
                        .and_where(assignment_submissions::Column::StudentId.eq(student_id))
                        .to_owned(),
                ),
            )
            .count(&self.db)
            .await
            .map_err(db_error("统计待提交作业失败"))?;

        Ok(count as i64)
    }

    /// 创建或替换提交，重新提交会清除评分
    pub async fn upsert_assignment_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
        file_url: String,
        status: SubmissionStatus,
    ) -> Result<AssignmentSubmission> {
        let now = chrono::Utc::now().timestamp();

        if let Some(existing) = self
            .get_student_assignment_submission_impl(assignment_id, student_id)
            .await?
        {
            return self
                .replace_submission(existing.id, file_url, status, now)
                .await;
        }

        let model = SubmissionActiveModel {
            assignment_id: Set(assignment_id),
            student_id: Set(student_id),
            file_url: Set(file_url.clone()),
            grade: Set(None),
            comment: Set(None),
            status: Set(status.to_string()),
            submitted_at: Set(now),
            graded_at: Set(None),
            graded_by: Set(None),
            ..Default::default()
        };

        match model.insert(&self.db).await.map_err(db_error("提交作业失败")) {
            Ok(inserted) => Ok(inserted.into_submission()),
            // 并发提交时另一请求已插入，改为覆盖
            Err(e) if e.is_conflict() => {
                let existing = self
                    .get_student_assignment_submission_impl(assignment_id, student_id)
                    .await?
                    .ok_or(e)?;
                self.replace_submission(existing.id, file_url, status, now)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn replace_submission(
        &self,
        submission_id: i64,
        file_url: String,
        status: SubmissionStatus,
        submitted_at: i64,
    ) -> Result<AssignmentSubmission> {
        let model = SubmissionActiveModel {
            id: Set(submission_id),
            file_url: Set(file_url),
            grade: Set(None),
            comment: Set(None),
            status: Set(status.to_string()),
            submitted_at: Set(submitted_at),
            graded_at: Set(None),
            graded_by: Set(None),
            ..Default::default()
        };

        let updated = model.update(&self.db).await.map_err(db_error("更新提交失败"))?;

        Ok(updated.into_submission())
    }

    pub async fn get_assignment_submission_by_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<AssignmentSubmission>> {
        let result = AssignmentSubmissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询提交失败"))?;

        Ok(result.map(|m| m.into_submission()))
    }

    pub async fn get_student_assignment_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<AssignmentSubmission>> {
        let result = AssignmentSubmissions::find()
            .filter(assignment_submissions::Column::AssignmentId.eq(assignment_id))
            .filter(assignment_submissions::Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(db_error("查询提交失败"))?;

        Ok(result.map(|m| m.into_submission()))
    }

    pub async fn list_assignment_submissions_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<SubmissionWithStudent>> {
        let rows = AssignmentSubmissions::find()
            .filter(assignment_submissions::Column::AssignmentId.eq(assignment_id))
            .find_also_related(Users)
            .order_by_asc(assignment_submissions::Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(db_error("查询提交列表失败"))?;

        Ok(rows
            .into_iter()
            .map(|(submission, user)| SubmissionWithStudent {
                submission: submission.into_submission(),
                student_name: student_name(user),
            })
            .collect())
    }

    pub async fn grade_assignment_submission_impl(
        &self,
        submission_id: i64,
        grade: f64,
        comment: Option<String>,
        graded_by: i64,
    ) -> Result<Option<AssignmentSubmission>> {
        if self
            .get_assignment_submission_by_id_impl(submission_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let model = SubmissionActiveModel {
            id: Set(submission_id),
            grade: Set(Some(grade)),
            comment: Set(comment),
            status: Set(SubmissionStatus::Graded.to_string()),
            graded_at: Set(Some(chrono::Utc::now().timestamp())),
            graded_by: Set(Some(graded_by)),
            ..Default::default()
        };

        let updated = model.update(&self.db).await.map_err(db_error("评分失败"))?;

        Ok(Some(updated.into_submission()))
    }

    /// 教师班级中尚未评分的提交数
    pub async fn count_ungraded_submissions_impl(&self, teacher_id: i64) -> Result<i64> {
        let count = AssignmentSubmissions::find()
            .join(
                JoinType::InnerJoin,
                assignment_submissions::Relation::Assignment.def(),
            )
            .join(
                JoinType::InnerJoin,
                crate::entity::assignments::Relation::Class.def(),
            )
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .filter(assignment_submissions::Column::Status.ne(SubmissionStatus::Graded.to_string()))
            .count(&self.db)
            .await
            .map_err(db_error("统计未评分提交失败"))?;

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_class, seed_user};

    async fn seed_assignment(storage: &SeaOrmStorage, class_id: i64, guru: i64) -> Assignment {
        storage
            .create_assignment_impl(
                class_id,
                guru,
                CreateAssignmentRequest {
                    title: "Latihan 1".to_string(),
                    description: None,
                    deadline: chrono::Utc::now() + chrono::Duration::days(1),
                    task_file_url: None,
                    video_url: None,
                    cover_url: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_resubmission_replaces_and_clears_grade() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;
        let assignment = seed_assignment(&storage, class_id, guru).await;

        let first = storage
            .upsert_assignment_submission_impl(
                assignment.id,
                murid,
                "https://files/a.pdf".to_string(),
                SubmissionStatus::Submitted,
            )
            .await
            .unwrap();
        storage
            .grade_assignment_submission_impl(first.id, 88.0, Some("Bagus".to_string()), guru)
            .await
            .unwrap();

        let second = storage
            .upsert_assignment_submission_impl(
                assignment.id,
                murid,
                "https://files/b.pdf".to_string(),
                SubmissionStatus::Late,
            )
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.file_url, "https://files/b.pdf");
        assert_eq!(second.status, SubmissionStatus::Late);
        assert!(second.grade.is_none());
        assert!(second.comment.is_none());

        let list = storage
            .list_assignment_submissions_impl(assignment.id)
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].student_name, "murid");
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;
        storage.enroll_student_impl(class_id, murid).await.unwrap();

        let a1 = seed_assignment(&storage, class_id, guru).await;
        seed_assignment(&storage, class_id, guru).await;

        assert_eq!(storage.count_pending_assignments_impl(murid).await.unwrap(), 2);
        assert_eq!(storage.count_assignments_impl(Some(guru)).await.unwrap(), 2);

        let sub = storage
            .upsert_assignment_submission_impl(
                a1.id,
                murid,
                "https://files/a.pdf".to_string(),
                SubmissionStatus::Submitted,
            )
            .await
            .unwrap();
        assert_eq!(storage.count_pending_assignments_impl(murid).await.unwrap(), 1);
        assert_eq!(storage.count_ungraded_submissions_impl(guru).await.unwrap(), 1);

        storage
            .grade_assignment_submission_impl(sub.id, 70.0, None, guru)
            .await
            .unwrap();
        assert_eq!(storage.count_ungraded_submissions_impl(guru).await.unwrap(), 0);
    }
}
