//! 考试题目实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exam_questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub exam_id: i64,
    pub question_type: String,
    pub question_text: String,
    /// JSON 字符串数组
    pub options: Option<String>,
    pub correct_option: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::exams::Entity",
        from = "Column::ExamId",
        to = "super::exams::Column::Id"
    )]
    Exam,
}

impl Related<super::exams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Exam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_question(self) -> crate::models::exams::entities::ExamQuestion {
        use crate::models::exams::entities::{ExamQuestion, QuestionType};

        let options = self
            .options
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default();

        ExamQuestion {
            id: self.id,
            exam_id: self.exam_id,
            question_type: self
                .question_type
                .parse()
                .unwrap_or(QuestionType::Essay),
            question_text: self.question_text,
            options,
            correct_option: self.correct_option,
            created_at: super::to_datetime(self.created_at),
        }
    }
}
