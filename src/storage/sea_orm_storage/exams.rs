//! 考试、题目与考试提交存储操作

use super::{SeaOrmStorage, db_error, student_name};
use crate::entity::exam_questions::{
    self, ActiveModel as QuestionActiveModel, Entity as ExamQuestions,
};
use crate::entity::exam_submissions::{
    self, ActiveModel as SubmissionActiveModel, Entity as ExamSubmissions,
};
use crate::entity::exams::{ActiveModel, Column, Entity as Exams};
use crate::entity::{classes, enrollments, users::Entity as Users};
use crate::errors::Result;
use crate::models::exams::{
    entities::{Exam, ExamQuestion, ExamSubmission, QuestionType},
    requests::{CreateExamRequest, CreateQuestionRequest, UpdateExamRequest, UpdateQuestionRequest},
    responses::ExamSubmissionWithStudent,
};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

/// 选项序列化为 JSON 文本，问答题不保存
fn encode_options(question_type: QuestionType, options: &[String]) -> Result<Option<String>> {
    match question_type {
        QuestionType::MultipleChoice => Ok(Some(serde_json::to_string(options)?)),
        QuestionType::Essay => Ok(None),
    }
}

impl SeaOrmStorage {
    pub async fn create_exam_impl(
        &self,
        class_id: i64,
        created_by: i64,
        req: CreateExamRequest,
    ) -> Result<Exam> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(class_id),
            title: Set(req.title),
            description: Set(req.description),
            exam_date: Set(req.exam_date),
            start_time: Set(req.start_time),
            duration_minutes: Set(req.duration_minutes),
            question_file_url: Set(req.question_file_url),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建考试失败"))?;

        Ok(result.into_exam())
    }

    pub async fn get_exam_by_id_impl(&self, exam_id: i64) -> Result<Option<Exam>> {
        let result = Exams::find_by_id(exam_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询考试失败"))?;

        Ok(result.map(|m| m.into_exam()))
    }

    /// 班级考试，按日期与开始时间排序
    pub async fn list_exams_impl(&self, class_id: i64) -> Result<Vec<Exam>> {
        let rows = Exams::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::ExamDate)
            .order_by_asc(Column::StartTime)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询考试列表失败"))?;

        Ok(rows.into_iter().map(|m| m.into_exam()).collect())
    }

    pub async fn update_exam_impl(
        &self,
        exam_id: i64,
        update: UpdateExamRequest,
    ) -> Result<Option<Exam>> {
        if self.get_exam_by_id_impl(exam_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(exam_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(exam_date) = update.exam_date {
            model.exam_date = Set(exam_date);
        }
        if let Some(start_time) = update.start_time {
            model.start_time = Set(start_time);
        }
        if let Some(duration_minutes) = update.duration_minutes {
            model.duration_minutes = Set(duration_minutes);
        }
        if let Some(question_file_url) = update.question_file_url {
            model.question_file_url = Set(Some(question_file_url));
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新考试失败"))?;

        Ok(Some(updated.into_exam()))
    }

    pub async fn delete_exam_impl(&self, exam_id: i64) -> Result<bool> {
        let result = Exams::delete_by_id(exam_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除考试失败"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_exams_impl(&self, teacher_id: Option<i64>) -> Result<i64> {
        let mut select = Exams::find();
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
            .map_err(db_error("统计考试数量失败"))?;

        Ok(count as i64)
    }

    /// 已选班级中尚未提交的考试数
    pub async fn count_pending_exams_impl(&self, student_id: i64) -> Result<i64> {
        let count = Exams::find()
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
                        .column(exam_submissions::Column::ExamId)
                        .from(exam_submissions::Entity)
                        .and_where(exam_submissions::Column::StudentId.eq(student_id))
                        .to_owned(),
                ),
            )
            .count(&self.db)
            .await
            .map_err(db_error("统计待完成考试失败"))?;

        Ok(count as i64)
    }

    // 题目

    pub async fn create_question_impl(
        &self,
        exam_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<ExamQuestion> {
        let model = QuestionActiveModel {
            exam_id: Set(exam_id),
            question_type: Set(req.question_type.to_string()),
            question_text: Set(req.question_text),
            options: Set(encode_options(req.question_type, &req.options)?),
            correct_option: Set(match req.question_type {
                QuestionType::MultipleChoice => req.correct_option,
                QuestionType::Essay => None,
            }),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建题目失败"))?;

        Ok(result.into_question())
    }

    pub async fn get_question_by_id_impl(&self, question_id: i64) -> Result<Option<ExamQuestion>> {
        let result = ExamQuestions::find_by_id(question_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询题目失败"))?;

        Ok(result.map(|m| m.into_question()))
    }

    /// 按创建顺序列出题目
    pub async fn list_questions_impl(&self, exam_id: i64) -> Result<Vec<ExamQuestion>> {
        let rows = ExamQuestions::find()
            .filter(exam_questions::Column::ExamId.eq(exam_id))
            .order_by_asc(exam_questions::Column::CreatedAt)
            .order_by_asc(exam_questions::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询题目列表失败"))?;

        Ok(rows.into_iter().map(|m| m.into_question()).collect())
    }

    pub async fn update_question_impl(
        &self,
        question_id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<ExamQuestion>> {
        let Some(existing) = self.get_question_by_id_impl(question_id).await? else {
            return Ok(None);
        };

        let mut model = QuestionActiveModel {
            id: Set(question_id),
            ..Default::default()
        };

        if let Some(question_text) = update.question_text {
            model.question_text = Set(question_text);
        }
        if existing.question_type == QuestionType::MultipleChoice {
            if let Some(options) = update.options {
                model.options = Set(encode_options(existing.question_type, &options)?);
            }
            if let Some(correct_option) = update.correct_option {
                model.correct_option = Set(Some(correct_option));
            }
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新题目失败"))?;

        Ok(Some(updated.into_question()))
    }

    pub async fn delete_question_impl(&self, question_id: i64) -> Result<bool> {
        let result = ExamQuestions::delete_by_id(question_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除题目失败"))?;

        Ok(result.rows_affected > 0)
    }

    // 考试提交

    /// 以 `examId_studentId` 为主键插入，已存在时返回 Conflict
    pub async fn create_exam_submission_impl(&self, submission: &ExamSubmission) -> Result<()> {
        let model = SubmissionActiveModel {
            id: Set(submission.id.clone()),
            exam_id: Set(submission.exam_id),
            student_id: Set(submission.student_id),
            answers: Set(serde_json::to_string(&submission.answers)?),
            score: Set(submission.score),
            essay_score: Set(submission.essay_score),
            final_grade: Set(submission.final_grade),
            trigger: Set(submission.trigger.to_string()),
            submitted_at: Set(submission.submitted_at.timestamp()),
            graded_at: Set(submission.graded_at.map(|t| t.timestamp())),
        };

        ExamSubmissions::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(db_error("保存考试提交失败"))?;

        Ok(())
    }

    pub async fn get_exam_submission_impl(
        &self,
        exam_id: i64,
        student_id: i64,
    ) -> Result<Option<ExamSubmission>> {
        let result = ExamSubmissions::find_by_id(ExamSubmission::key(exam_id, student_id))
            .one(&self.db)
            .await
            .map_err(db_error("查询考试提交失败"))?;

        Ok(result.map(|m| m.into_submission()))
    }

    pub async fn list_exam_submissions_impl(
        &self,
        exam_id: i64,
    ) -> Result<Vec<ExamSubmissionWithStudent>> {
        let rows = ExamSubmissions::find()
            .filter(exam_submissions::Column::ExamId.eq(exam_id))
            .find_also_related(Users)
            .order_by_asc(exam_submissions::Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(db_error("查询考试提交列表失败"))?;

        Ok(rows
            .into_iter()
            .map(|(submission, user)| ExamSubmissionWithStudent {
                submission: submission.into_submission(),
                student_name: student_name(user),
            })
            .collect())
    }

    pub async fn set_exam_essay_score_impl(
        &self,
        exam_id: i64,
        student_id: i64,
        essay_score: i32,
        final_grade: i32,
    ) -> Result<Option<ExamSubmission>> {
        let key = ExamSubmission::key(exam_id, student_id);
        if ExamSubmissions::find_by_id(key.clone())
            .one(&self.db)
            .await
            .map_err(db_error("查询考试提交失败"))?
            .is_none()
        {
            return Ok(None);
        }

        let model = SubmissionActiveModel {
            id: Set(key),
            essay_score: Set(Some(essay_score)),
            final_grade: Set(final_grade),
            graded_at: Set(Some(chrono::Utc::now().timestamp())),
            ..Default::default()
        };

        let updated = model
            .update(&self.db)
            .await
            .map_err(db_error("保存问答题得分失败"))?;

        Ok(Some(updated.into_submission()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::entities::{AnswerRecord, SubmitTrigger};
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_class, seed_user};

    async fn seed_exam(storage: &SeaOrmStorage, class_id: i64, guru: i64) -> Exam {
        storage
            .create_exam_impl(
                class_id,
                guru,
                CreateExamRequest {
                    title: "UTS".to_string(),
                    description: None,
                    exam_date: "2025-03-10".to_string(),
                    start_time: "08:00".to_string(),
                    duration_minutes: 60,
                    question_file_url: None,
                },
            )
            .await
            .unwrap()
    }

    fn submission(exam_id: i64, student_id: i64, score: i32) -> ExamSubmission {
        ExamSubmission {
            id: ExamSubmission::key(exam_id, student_id),
            exam_id,
            student_id,
            answers: vec![AnswerRecord {
                question_id: 1,
                question_type: QuestionType::Essay,
                question_text: "Jelaskan".to_string(),
                answer: String::new(),
                is_correct: None,
            }],
            score,
            essay_score: None,
            final_grade: score,
            trigger: SubmitTrigger::Timeout,
            submitted_at: chrono::Utc::now(),
            graded_at: None,
        }
    }

    #[tokio::test]
    async fn test_questions_keep_creation_order_and_options() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let class_id = seed_class(&storage, guru).await;
        let exam = seed_exam(&storage, class_id, guru).await;

        for text in ["Soal 1", "Soal 2"] {
            storage
                .create_question_impl(
                    exam.id,
                    CreateQuestionRequest {
                        question_type: QuestionType::MultipleChoice,
                        question_text: text.to_string(),
                        options: vec!["A".to_string(), "B".to_string()],
                        correct_option: Some("B".to_string()),
                    },
                )
                .await
                .unwrap();
        }
        storage
            .create_question_impl(
                exam.id,
                CreateQuestionRequest {
                    question_type: QuestionType::Essay,
                    question_text: "Soal 3".to_string(),
                    options: vec![],
                    correct_option: None,
                },
            )
            .await
            .unwrap();

        let questions = storage.list_questions_impl(exam.id).await.unwrap();
        let texts: Vec<_> = questions.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts, vec!["Soal 1", "Soal 2", "Soal 3"]);
        assert_eq!(questions[0].options, vec!["A", "B"]);
        assert_eq!(questions[0].correct_option.as_deref(), Some("B"));
        assert!(questions[2].options.is_empty());
    }

    #[tokio::test]
    async fn test_exam_submission_is_create_if_absent() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;
        let exam = seed_exam(&storage, class_id, guru).await;

        storage
            .create_exam_submission_impl(&submission(exam.id, murid, 80))
            .await
            .unwrap();
        let err = storage
            .create_exam_submission_impl(&submission(exam.id, murid, 10))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let stored = storage
            .get_exam_submission_impl(exam.id, murid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, 80);
        assert_eq!(stored.answers[0].answer, "");
        assert_eq!(stored.trigger, SubmitTrigger::Timeout);
        assert_eq!(storage.list_exam_submissions_impl(exam.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_essay_score_updates_final_grade() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;
        let exam = seed_exam(&storage, class_id, guru).await;

        assert!(
            storage
                .set_exam_essay_score_impl(exam.id, murid, 90, 90)
                .await
                .unwrap()
                .is_none()
        );

        storage
            .create_exam_submission_impl(&submission(exam.id, murid, 100))
            .await
            .unwrap();
        let updated = storage
            .set_exam_essay_score_impl(exam.id, murid, 50, 83)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.essay_score, Some(50));
        assert_eq!(updated.final_grade, 83);
        assert!(updated.graded_at.is_some());
    }

    #[tokio::test]
    async fn test_pending_exams_for_student() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;
        storage.enroll_student_impl(class_id, murid).await.unwrap();
        let exam = seed_exam(&storage, class_id, guru).await;

        assert_eq!(storage.count_pending_exams_impl(murid).await.unwrap(), 1);
        storage
            .create_exam_submission_impl(&submission(exam.id, murid, 0))
            .await
            .unwrap();
        assert_eq!(storage.count_pending_exams_impl(murid).await.unwrap(), 0);
        assert_eq!(storage.count_exams_impl(Some(guru)).await.unwrap(), 1);
    }
}
