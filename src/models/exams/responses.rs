use std::collections::HashMap;

use super::entities::{Exam, ExamQuestion, ExamQuestionView, ExamSubmission};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamListResponse {
    pub items: Vec<Exam>,
}

/// 教师视角的题目列表（含正确答案）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct QuestionListResponse {
    pub items: Vec<ExamQuestion>,
}

/// 考试会话状态
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub enum ExamSessionResponse {
    NotStarted {
        starts_at: Option<DateTime<Utc>>,
    },
    InProgress {
        ends_at: DateTime<Utc>,
        remaining_seconds: i64,
        questions: Vec<ExamQuestionView>,
        answers: HashMap<i64, String>,
    },
    Submitted {
        submission: ExamSubmission,
    },
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamSubmissionWithStudent {
    pub submission: ExamSubmission,
    pub student_name: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamSubmissionListResponse {
    pub items: Vec<ExamSubmissionWithStudent>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct MyExamSubmissionResponse {
    pub submission: Option<ExamSubmission>,
}
