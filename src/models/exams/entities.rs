use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const EXAM_DATE_FORMAT: &str = "%Y-%m-%d";
pub const EXAM_TIME_FORMAT: &str = "%H:%M";

/// 考试（ujian）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct Exam {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// YYYY-MM-DD
    pub exam_date: String,
    /// HH:MM
    pub start_time: String,
    pub duration_minutes: i32,
    pub question_file_url: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    /// 计划开始时间，日期与时间按给定时区解释
    pub fn scheduled_start(&self, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(&self.exam_date, EXAM_DATE_FORMAT).ok()?;
        let time = NaiveTime::parse_from_str(&self.start_time, EXAM_TIME_FORMAT).ok()?;
        offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub enum QuestionType {
    MultipleChoice,
    Essay,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::Essay => write!(f, "essay"),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            "essay" => Ok(QuestionType::Essay),
            _ => Err(format!("Invalid question type: {s}")),
        }
    }
}

/// 考试题目（soal），按创建顺序排列
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamQuestion {
    pub id: i64,
    pub exam_id: i64,
    pub question_type: QuestionType,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 学生可见的题目，不含正确答案
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamQuestionView {
    pub id: i64,
    pub question_type: QuestionType,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<&ExamQuestion> for ExamQuestionView {
    fn from(q: &ExamQuestion) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            question_text: q.question_text.clone(),
            options: q.options.clone(),
        }
    }
}

/// 选择题至少两个互不相同的选项，正确答案必须是其中之一；问答题无选项
pub fn validate_question(
    question_type: QuestionType,
    options: &[String],
    correct_option: Option<&str>,
) -> Result<(), &'static str> {
    match question_type {
        QuestionType::MultipleChoice => {
            let non_empty = options.iter().filter(|o| !o.trim().is_empty()).count();
            if non_empty < 2 || non_empty != options.len() {
                return Err("Multiple-choice questions need at least two non-empty options");
            }
            let mut unique: Vec<&String> = options.iter().collect();
            unique.sort();
            unique.dedup();
            if unique.len() != options.len() {
                return Err("Options must be distinct");
            }
            match correct_option {
                Some(correct) if options.iter().any(|o| o == correct) => Ok(()),
                _ => Err("The correct option must be one of the options"),
            }
        }
        QuestionType::Essay => {
            if !options.is_empty() || correct_option.is_some() {
                Err("Essay questions have no options")
            } else {
                Ok(())
            }
        }
    }
}

/// 提交触发方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub enum SubmitTrigger {
    /// 学生主动提交
    Manual,
    /// 倒计时结束自动提交
    Timeout,
}

impl std::fmt::Display for SubmitTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitTrigger::Manual => write!(f, "manual"),
            SubmitTrigger::Timeout => write!(f, "timeout"),
        }
    }
}

impl std::str::FromStr for SubmitTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SubmitTrigger::Manual),
            "timeout" => Ok(SubmitTrigger::Timeout),
            _ => Err(format!("Invalid submit trigger: {s}")),
        }
    }
}

/// 单题作答记录
///
/// 问答题的答案原样保存（未作答为空字符串），且不带 `is_correct`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct AnswerRecord {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub question_text: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub is_correct: Option<bool>,
}

/// 考试提交，主键为 `"{exam_id}_{student_id}"`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct ExamSubmission {
    pub id: String,
    pub exam_id: i64,
    pub student_id: i64,
    pub answers: Vec<AnswerRecord>,
    /// 选择题自动得分 0..=100
    pub score: i32,
    /// 教师给出的问答题得分 0..=100
    pub essay_score: Option<i32>,
    pub final_grade: i32,
    pub trigger: SubmitTrigger,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl ExamSubmission {
    pub fn key(exam_id: i64, student_id: i64) -> String {
        format!("{exam_id}_{student_id}")
    }

    pub fn multiple_choice_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.question_type == QuestionType::MultipleChoice)
            .count()
    }

    pub fn essay_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.question_type == QuestionType::Essay)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exam(date: &str, time: &str) -> Exam {
        Exam {
            id: 1,
            class_id: 1,
            title: "UTS".into(),
            description: None,
            exam_date: date.into(),
            start_time: time.into(),
            duration_minutes: 90,
            question_file_url: None,
            created_by: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_scheduled_start_uses_offset() {
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let start = exam("2025-03-10", "08:00").scheduled_start(wib).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-10T01:00:00+00:00");
    }

    #[test]
    fn test_scheduled_start_rejects_garbage() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(exam("10/03/2025", "08:00").scheduled_start(utc).is_none());
        assert!(exam("2025-03-10", "8 pagi").scheduled_start(utc).is_none());
    }

    #[test]
    fn test_validate_question() {
        let opts = vec!["A".to_string(), "B".to_string()];
        assert!(validate_question(QuestionType::MultipleChoice, &opts, Some("A")).is_ok());
        assert!(validate_question(QuestionType::MultipleChoice, &opts, Some("C")).is_err());
        assert!(validate_question(QuestionType::MultipleChoice, &opts, None).is_err());
        assert!(
            validate_question(QuestionType::MultipleChoice, &["A".to_string()], Some("A")).is_err()
        );
        let dup = vec!["A".to_string(), "A".to_string()];
        assert!(validate_question(QuestionType::MultipleChoice, &dup, Some("A")).is_err());
        assert!(validate_question(QuestionType::Essay, &[], None).is_ok());
        assert!(validate_question(QuestionType::Essay, &opts, None).is_err());
    }

    #[test]
    fn test_essay_answer_omits_is_correct() {
        let record = AnswerRecord {
            question_id: 3,
            question_type: QuestionType::Essay,
            question_text: "Jelaskan".into(),
            answer: String::new(),
            is_correct: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["answer"], "");
        assert!(json.get("is_correct").is_none());
    }

    #[test]
    fn test_submission_key() {
        assert_eq!(ExamSubmission::key(12, 34), "12_34");
    }
}
