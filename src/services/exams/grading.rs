//! 自动评分
//!
//! 选择题得分 = round(100 * K / N)，N 为选择题数，K 为答对数；N 为 0 时得 0 分。
//! 问答题答案原样保存，不参与自动评分。

use std::collections::HashMap;

use crate::models::exams::entities::{AnswerRecord, ExamQuestion, QuestionType};

/// 答对 `correct` 道、共 `total` 道选择题时的得分
pub fn score(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as i32
}

/// 按题目顺序生成作答明细并计算选择题得分
pub fn grade(questions: &[ExamQuestion], answers: &HashMap<i64, String>) -> (Vec<AnswerRecord>, i32) {
    let mut total = 0;
    let mut correct = 0;

    let records = questions
        .iter()
        .map(|q| {
            let answer = answers.get(&q.id).cloned().unwrap_or_default();
            let is_correct = match q.question_type {
                QuestionType::MultipleChoice => {
                    let hit = !answer.is_empty() && q.correct_option.as_deref() == Some(answer.as_str());
                    total += 1;
                    if hit {
                        correct += 1;
                    }
                    Some(hit)
                }
                QuestionType::Essay => None,
            };
            AnswerRecord {
                question_id: q.id,
                question_type: q.question_type,
                question_text: q.question_text.clone(),
                answer,
                is_correct,
            }
        })
        .collect();

    (records, score(correct, total))
}

/// 最终成绩：有问答题得分时按题数加权合并，否则等于选择题得分
pub fn final_grade(
    score: i32,
    essay_score: Option<i32>,
    multiple_choice: usize,
    essays: usize,
) -> i32 {
    match essay_score {
        Some(essay) if essays > 0 => {
            let weighted = score as f64 * multiple_choice as f64 + essay as f64 * essays as f64;
            (weighted / (multiple_choice + essays) as f64).round() as i32
        }
        _ => score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mc(id: i64, correct: &str) -> ExamQuestion {
        ExamQuestion {
            id,
            exam_id: 1,
            question_type: QuestionType::MultipleChoice,
            question_text: format!("Soal {id}"),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_option: Some(correct.into()),
            created_at: Utc::now(),
        }
    }

    fn essay(id: i64) -> ExamQuestion {
        ExamQuestion {
            id,
            exam_id: 1,
            question_type: QuestionType::Essay,
            question_text: "Jelaskan fotosintesis".into(),
            options: vec![],
            correct_option: None,
            created_at: Utc::now(),
        }
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_score_extremes() {
        let questions = vec![mc(1, "A"), mc(2, "B"), mc(3, "C")];
        let (_, all) = grade(&questions, &answers(&[(1, "A"), (2, "B"), (3, "C")]));
        assert_eq!(all, 100);
        let (_, none) = grade(&questions, &answers(&[(1, "D"), (2, "D"), (3, "D")]));
        assert_eq!(none, 0);
        let (_, blank) = grade(&questions, &HashMap::new());
        assert_eq!(blank, 0);
    }

    #[test]
    fn test_three_of_four_is_75() {
        let questions = vec![mc(1, "A"), mc(2, "B"), mc(3, "C"), mc(4, "D")];
        let (records, score) = grade(
            &questions,
            &answers(&[(1, "A"), (2, "B"), (3, "C"), (4, "A")]),
        );
        assert_eq!(score, 75);
        assert_eq!(records[3].is_correct, Some(false));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(score(1, 3), 33);
        assert_eq!(score(2, 3), 67);
        assert_eq!(score(1, 8), 13);
        assert_eq!(score(0, 0), 0);
    }

    #[test]
    fn test_blank_essay_is_kept_and_not_scored() {
        let questions = vec![mc(1, "A"), essay(2), mc(3, "B")];
        let (records, score) = grade(&questions, &answers(&[(1, "A"), (3, "B")]));

        assert_eq!(score, 100);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].question_type, QuestionType::Essay);
        assert_eq!(records[1].answer, "");
        assert_eq!(records[1].is_correct, None);
    }

    #[test]
    fn test_essay_only_exam_scores_zero() {
        let (records, score) = grade(&[essay(1)], &answers(&[(1, "Tumbuhan memasak")]));
        assert_eq!(score, 0);
        assert_eq!(records[0].answer, "Tumbuhan memasak");
    }

    #[test]
    fn test_final_grade() {
        assert_eq!(final_grade(75, None, 4, 1), 75);
        assert_eq!(final_grade(100, Some(50), 2, 1), 83);
        assert_eq!(final_grade(0, Some(90), 0, 2), 90);
        assert_eq!(final_grade(80, Some(10), 4, 0), 80);
    }
}
