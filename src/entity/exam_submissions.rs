//! 考试提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exam_submissions")]
pub struct Model {
    /// `"{exam_id}_{student_id}"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub exam_id: i64,
    pub student_id: i64,
    /// JSON 作答记录
    pub answers: String,
    pub score: i32,
    pub essay_score: Option<i32>,
    pub final_grade: i32,
    pub trigger: String,
    pub submitted_at: i64,
    pub graded_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exams::Entity",
        from = "Column::ExamId",
        to = "super::exams::Column::Id"
    )]
    Exam,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::StudentId",
        to = "super::users::Column::Id"
    )]
    Student,
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_submission(self) -> crate::models::exams::entities::ExamSubmission {
        use super::to_datetime;
        use crate::models::exams::entities::{ExamSubmission, SubmitTrigger};

        ExamSubmission {
            id: self.id,
            exam_id: self.exam_id,
            student_id: self.student_id,
            answers: serde_json::from_str(&self.answers).unwrap_or_default(),
            score: self.score,
            essay_score: self.essay_score,
            final_grade: self.final_grade,
            trigger: self.trigger.parse().unwrap_or(SubmitTrigger::Manual),
            submitted_at: to_datetime(self.submitted_at),
            graded_at: self.graded_at.map(to_datetime),
        }
    }
}
