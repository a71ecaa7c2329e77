//! 考试会话
//!
//! 每个 (考试, 学生) 至多一个进行中的会话，答案只保存在内存。
//! 每个会话有一个服务端倒计时任务，到点后与手动交卷走同一提交流程。
//! 提交权通过在分片锁内置位 `submitting` 抢占，后到的触发方看到的是已被占用或已移除的会话。
//! 倒计时在 `ends_at` 加宽限期后触发；交卷成功的键短期保留，期间不能再开新会话。

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::grading;
use crate::errors::LmsError;
use crate::models::exams::entities::{
    ExamQuestion, ExamQuestionView, ExamSubmission, QuestionType, SubmitTrigger,
};
use crate::storage::Storage;

/// 持久化失败后再次尝试自动提交的间隔
const RETRY_DELAY: Duration = Duration::from_secs(5);
/// 已交卷键的保留时长，覆盖读取提交记录与开新会话之间的窗口
const FINISHED_TTL: Duration = Duration::from_secs(600);
const ESSAY_ANSWER_MAX: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub exam_id: i64,
    pub student_id: i64,
}

impl SessionKey {
    pub fn new(exam_id: i64, student_id: i64) -> Self {
        Self {
            exam_id,
            student_id,
        }
    }
}

struct ExamSession {
    ends_at: DateTime<Utc>,
    /// 倒计时触发时刻，含宽限期
    deadline: Instant,
    questions: Vec<ExamQuestion>,
    answers: HashMap<i64, String>,
    submitting: bool,
    timer: Option<AbortHandle>,
}

/// 返回给学生的会话快照，不含正确答案
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub ends_at: DateTime<Utc>,
    pub questions: Vec<ExamQuestionView>,
    pub answers: HashMap<i64, String>,
    pub submitting: bool,
}

impl SessionSnapshot {
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.ends_at - now).num_seconds().max(0)
    }
}

impl From<&ExamSession> for SessionSnapshot {
    fn from(s: &ExamSession) -> Self {
        Self {
            ends_at: s.ends_at,
            questions: s.questions.iter().map(ExamQuestionView::from).collect(),
            answers: s.answers.clone(),
            submitting: s.submitting,
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    NotFound,
    Submitting,
    TimeOver,
    UnknownQuestion,
    InvalidAnswer(&'static str),
    AlreadySubmitted,
    Storage(LmsError),
}

pub struct ExamSessionRegistry {
    sessions: DashMap<SessionKey, ExamSession>,
    finished: DashMap<SessionKey, Instant>,
    storage: Arc<dyn Storage>,
    grace: chrono::Duration,
}

impl ExamSessionRegistry {
    pub fn new(storage: Arc<dyn Storage>, grace_seconds: i64) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            finished: DashMap::new(),
            storage,
            grace: chrono::Duration::seconds(grace_seconds.max(0)),
        })
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn snapshot(&self, key: SessionKey) -> Option<SessionSnapshot> {
        self.sessions.get(&key).map(|s| SessionSnapshot::from(&*s))
    }

    /// 开始会话；已存在时返回现有会话，刚交卷的返回 `AlreadySubmitted`
    pub fn start(
        self: &Arc<Self>,
        key: SessionKey,
        questions: Vec<ExamQuestion>,
        duration: Duration,
    ) -> Result<SessionSnapshot, SessionError> {
        match self.sessions.entry(key) {
            Entry::Occupied(existing) => Ok(SessionSnapshot::from(existing.get())),
            Entry::Vacant(_) if self.is_finished(key) => Err(SessionError::AlreadySubmitted),
            Entry::Vacant(slot) => {
                let grace = self.grace.to_std().unwrap_or(Duration::ZERO);
                let deadline = Instant::now() + duration + grace;
                let ends_at = Utc::now()
                    + chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero());
                let session = ExamSession {
                    ends_at,
                    deadline,
                    questions,
                    answers: HashMap::new(),
                    submitting: false,
                    timer: Some(self.spawn_timer(key, deadline)),
                };
                info!(
                    "Exam session started: exam {} student {} ends at {}",
                    key.exam_id, key.student_id, ends_at
                );
                Ok(SessionSnapshot::from(&*slot.insert(session)))
            }
        }
    }

    fn is_finished(&self, key: SessionKey) -> bool {
        self.finished
            .get(&key)
            .is_some_and(|at| at.elapsed() < FINISHED_TTL)
    }

    /// 先登记已交卷再移除会话，`start` 不会在两者之间看到空位
    fn close(&self, key: SessionKey) {
        self.finished.retain(|_, at| at.elapsed() < FINISHED_TTL);
        self.finished.insert(key, Instant::now());
        self.sessions.remove(&key);
    }

    fn spawn_timer(self: &Arc<Self>, key: SessionKey, deadline: Instant) -> AbortHandle {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let Some(registry) = registry.upgrade() else {
                return;
            };
            match registry.finish(key, SubmitTrigger::Timeout).await {
                Ok(Some(_)) => info!(
                    "Exam {} auto-submitted for student {}",
                    key.exam_id, key.student_id
                ),
                Ok(None) => debug!(
                    "Countdown for exam {} student {} found no open session",
                    key.exam_id, key.student_id
                ),
                Err(e) => warn!(
                    "Auto-submit of exam {} for student {} failed: {:?}",
                    key.exam_id, key.student_id, e
                ),
            }
        })
        .abort_handle()
    }

    /// 保存单题答案；选择题答案必须是选项之一，空字符串表示清除
    pub fn save_answer(
        &self,
        key: SessionKey,
        question_id: i64,
        answer: String,
    ) -> Result<(), SessionError> {
        let mut session = self.sessions.get_mut(&key).ok_or(SessionError::NotFound)?;
        if session.submitting {
            return Err(SessionError::Submitting);
        }
        if Utc::now() > session.ends_at + self.grace {
            return Err(SessionError::TimeOver);
        }

        let question = session
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(SessionError::UnknownQuestion)?;
        match question.question_type {
            QuestionType::MultipleChoice => {
                if !answer.is_empty() && !question.options.contains(&answer) {
                    return Err(SessionError::InvalidAnswer(
                        "Answer must be one of the options",
                    ));
                }
            }
            QuestionType::Essay => {
                if answer.chars().count() > ESSAY_ANSWER_MAX {
                    return Err(SessionError::InvalidAnswer("Essay answer is too long"));
                }
            }
        }

        if answer.is_empty() {
            session.answers.remove(&question_id);
        } else {
            session.answers.insert(question_id, answer);
        }
        Ok(())
    }

    /// 交卷，手动与倒计时共用
    ///
    /// 返回 `Ok(None)` 表示没有可提交的会话（不存在或已由另一方提交中）。
    /// 已存在提交记录时返回已有记录。持久化失败时会话恢复为进行中，可重试。
    pub async fn finish(
        self: &Arc<Self>,
        key: SessionKey,
        trigger: SubmitTrigger,
    ) -> Result<Option<ExamSubmission>, SessionError> {
        let (questions, answers, deadline) = {
            let Some(mut session) = self.sessions.get_mut(&key) else {
                return Ok(None);
            };
            if session.submitting {
                return Ok(None);
            }
            session.submitting = true;
            if let Some(timer) = session.timer.take() {
                // 倒计时任务自身触发时不能中止自己
                if trigger == SubmitTrigger::Manual {
                    timer.abort();
                }
            }
            (
                session.questions.clone(),
                session.answers.clone(),
                session.deadline,
            )
        };

        let (records, score) = grading::grade(&questions, &answers);
        let submission = ExamSubmission {
            id: ExamSubmission::key(key.exam_id, key.student_id),
            exam_id: key.exam_id,
            student_id: key.student_id,
            answers: records,
            score,
            essay_score: None,
            final_grade: score,
            trigger,
            submitted_at: Utc::now(),
            graded_at: None,
        };

        match self.storage.create_exam_submission(&submission).await {
            Ok(()) => {
                self.close(key);
                info!(
                    "Exam {} submitted by student {} ({}), score {}",
                    key.exam_id, key.student_id, trigger, score
                );
                Ok(Some(submission))
            }
            Err(LmsError::Conflict(_)) => {
                self.close(key);
                info!(
                    "Exam {} already submitted by student {}, keeping the stored submission",
                    key.exam_id, key.student_id
                );
                self.storage
                    .get_exam_submission(key.exam_id, key.student_id)
                    .await
                    .map_err(SessionError::Storage)
            }
            Err(e) => {
                warn!(
                    "Persisting exam {} for student {} failed, session restored: {}",
                    key.exam_id, key.student_id, e
                );
                if let Some(mut session) = self.sessions.get_mut(&key) {
                    session.submitting = false;
                    let retry_at = deadline.max(Instant::now() + RETRY_DELAY);
                    session.timer = Some(self.spawn_timer(key, retry_at));
                }
                Err(SessionError::Storage(e))
            }
        }
    }

    /// 删除考试时丢弃其所有进行中的会话
    pub fn discard_exam(&self, exam_id: i64) {
        self.finished.retain(|key, _| key.exam_id != exam_id);
        self.sessions.retain(|key, session| {
            if key.exam_id != exam_id {
                return true;
            }
            if let Some(timer) = session.timer.take() {
                timer.abort();
            }
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::requests::{CreateExamRequest, CreateQuestionRequest};
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{
        SeaOrmStorage,
        test_support::{seed_class, seed_user},
    };

    struct Fixture {
        storage: Arc<SeaOrmStorage>,
        registry: Arc<ExamSessionRegistry>,
        questions: Vec<ExamQuestion>,
        key: SessionKey,
    }

    async fn fixture() -> Fixture {
        fixture_with_grace(0).await
    }

    async fn fixture_with_grace(grace_seconds: i64) -> Fixture {
        let storage = Arc::new(SeaOrmStorage::in_memory().await);
        let guru = seed_user(&storage, "bu_rina", UserRole::Guru).await;
        let murid = seed_user(&storage, "budi", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;
        let exam = storage
            .create_exam(
                class_id,
                guru,
                CreateExamRequest {
                    title: "Ulangan Harian".into(),
                    description: None,
                    exam_date: "2025-01-06".into(),
                    start_time: "07:30".into(),
                    duration_minutes: 30,
                    question_file_url: None,
                },
            )
            .await
            .unwrap();

        let mut questions = Vec::new();
        for (text, correct) in [("2 + 2 = ?", "4"), ("3 x 3 = ?", "9")] {
            let q = storage
                .create_question(
                    exam.id,
                    CreateQuestionRequest {
                        question_type: QuestionType::MultipleChoice,
                        question_text: text.into(),
                        options: vec!["4".into(), "6".into(), "9".into()],
                        correct_option: Some(correct.into()),
                    },
                )
                .await
                .unwrap();
            questions.push(q);
        }
        let essay = storage
            .create_question(
                exam.id,
                CreateQuestionRequest {
                    question_type: QuestionType::Essay,
                    question_text: "Jelaskan bilangan prima".into(),
                    options: vec![],
                    correct_option: None,
                },
            )
            .await
            .unwrap();
        questions.push(essay);

        let registry = ExamSessionRegistry::new(storage.clone(), grace_seconds);
        Fixture {
            storage,
            registry,
            questions,
            key: SessionKey::new(exam.id, murid),
        }
    }

    async fn wait_for_submission(f: &Fixture) -> Option<ExamSubmission> {
        for _ in 0..100 {
            if let Some(s) = f
                .storage
                .get_exam_submission(f.key.exam_id, f.key.student_id)
                .await
                .unwrap()
            {
                return Some(s);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_countdown_submits_exactly_once() {
        let f = fixture().await;
        let snapshot = f
            .registry
            .start(f.key, f.questions.clone(), Duration::from_millis(200))
            .unwrap();
        assert_eq!(snapshot.questions.len(), 3);

        f.registry
            .save_answer(f.key, f.questions[0].id, "4".into())
            .unwrap();
        f.registry
            .save_answer(f.key, f.questions[1].id, "9".into())
            .unwrap();

        let submission = wait_for_submission(&f).await.expect("auto submission");
        assert_eq!(submission.trigger, SubmitTrigger::Timeout);
        assert_eq!(submission.score, 100);
        assert_eq!(submission.answers[2].answer, "");
        assert_eq!(submission.answers[2].is_correct, None);

        // 倒计时之后的手动交卷看不到会话
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(f.registry.snapshot(f.key).is_none());
        let again = f.registry.finish(f.key, SubmitTrigger::Manual).await.unwrap();
        assert!(again.is_none());
        assert_eq!(
            f.storage
                .list_exam_submissions(f.key.exam_id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_manual_submit_cancels_countdown() {
        let f = fixture().await;
        f.registry
            .start(f.key, f.questions.clone(), Duration::from_secs(60))
            .unwrap();
        f.registry
            .save_answer(f.key, f.questions[0].id, "6".into())
            .unwrap();

        let submission = f
            .registry
            .finish(f.key, SubmitTrigger::Manual)
            .await
            .unwrap()
            .expect("manual submission");
        assert_eq!(submission.trigger, SubmitTrigger::Manual);
        assert_eq!(submission.score, 0);
        assert_eq!(f.registry.active_count(), 0);

        assert!(
            f.registry
                .finish(f.key, SubmitTrigger::Timeout)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let f = fixture().await;
        let first = f
            .registry
            .start(f.key, f.questions.clone(), Duration::from_secs(60))
            .unwrap();
        f.registry
            .save_answer(f.key, f.questions[1].id, "9".into())
            .unwrap();
        let second = f
            .registry
            .start(f.key, f.questions.clone(), Duration::from_secs(600))
            .unwrap();

        assert_eq!(first.ends_at, second.ends_at);
        assert_eq!(second.answers.get(&f.questions[1].id).map(String::as_str), Some("9"));
        assert_eq!(f.registry.active_count(), 1);
        f.registry.discard_exam(f.key.exam_id);
        assert_eq!(f.registry.active_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_submission_yields_stored_one() {
        let f = fixture().await;
        f.registry
            .start(f.key, f.questions.clone(), Duration::from_secs(60))
            .unwrap();
        let first = f
            .registry
            .finish(f.key, SubmitTrigger::Manual)
            .await
            .unwrap()
            .unwrap();

        // 另一个进程里的会话交卷时撞上唯一键，返回已有提交
        let other = ExamSessionRegistry::new(f.storage.clone(), 0);
        other
            .start(f.key, f.questions.clone(), Duration::from_secs(60))
            .unwrap();
        other
            .save_answer(f.key, f.questions[0].id, "4".into())
            .unwrap();
        let second = other
            .finish(f.key, SubmitTrigger::Manual)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.score, first.score);
        assert_eq!(other.active_count(), 0);
    }

    #[tokio::test]
    async fn test_no_new_session_after_submit() {
        let f = fixture().await;
        f.registry
            .start(f.key, f.questions.clone(), Duration::from_secs(60))
            .unwrap();

        // 另一标签页在交卷前读到“无提交记录”，交卷后才来开会话
        let seen_before = f
            .storage
            .get_exam_submission(f.key.exam_id, f.key.student_id)
            .await
            .unwrap();
        assert!(seen_before.is_none());
        f.registry
            .finish(f.key, SubmitTrigger::Manual)
            .await
            .unwrap()
            .expect("manual submission");

        assert!(f.registry.snapshot(f.key).is_none());
        assert!(matches!(
            f.registry
                .start(f.key, f.questions.clone(), Duration::from_secs(60)),
            Err(SessionError::AlreadySubmitted)
        ));
        assert_eq!(f.registry.active_count(), 0);

        // 删除考试后记录一并清除
        f.registry.discard_exam(f.key.exam_id);
        assert!(!f.registry.is_finished(f.key));
    }

    #[tokio::test]
    async fn test_answers_accepted_during_grace() {
        let f = fixture_with_grace(1).await;
        let snapshot = f
            .registry
            .start(f.key, f.questions.clone(), Duration::from_millis(100))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(Utc::now() > snapshot.ends_at);
        f.registry
            .save_answer(f.key, f.questions[0].id, "4".into())
            .unwrap();
        assert!(f.registry.snapshot(f.key).is_some());

        let submission = wait_for_submission(&f).await.expect("auto submission");
        assert_eq!(submission.trigger, SubmitTrigger::Timeout);
        assert_eq!(submission.answers[0].answer, "4");
        assert_eq!(f.registry.active_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_validation() {
        let f = fixture().await;
        assert!(matches!(
            f.registry.save_answer(f.key, f.questions[0].id, "4".into()),
            Err(SessionError::NotFound)
        ));

        f.registry
            .start(f.key, f.questions.clone(), Duration::from_secs(60))
            .unwrap();
        assert!(matches!(
            f.registry.save_answer(f.key, f.questions[0].id, "5".into()),
            Err(SessionError::InvalidAnswer(_))
        ));
        assert!(matches!(
            f.registry.save_answer(f.key, 9999, "4".into()),
            Err(SessionError::UnknownQuestion)
        ));

        // 选择题答案互斥，后选覆盖先选
        f.registry
            .save_answer(f.key, f.questions[0].id, "4".into())
            .unwrap();
        f.registry
            .save_answer(f.key, f.questions[0].id, "6".into())
            .unwrap();
        let snapshot = f.registry.snapshot(f.key).unwrap();
        assert_eq!(snapshot.answers[&f.questions[0].id], "6");

        f.registry.sessions.get_mut(&f.key).unwrap().ends_at =
            Utc::now() - chrono::Duration::seconds(5);
        assert!(matches!(
            f.registry
                .save_answer(f.key, f.questions[2].id, "Bilangan prima ...".into()),
            Err(SessionError::TimeOver)
        ));
        f.registry.discard_exam(f.key.exam_id);
    }

    #[test]
    fn test_remaining_seconds_never_negative() {
        let now = Utc::now();
        let snapshot = SessionSnapshot {
            ends_at: now - chrono::Duration::seconds(3),
            questions: vec![],
            answers: HashMap::new(),
            submitting: false,
        };
        assert_eq!(snapshot.remaining_seconds(now), 0);
        let snapshot = SessionSnapshot {
            ends_at: now + chrono::Duration::seconds(90),
            ..snapshot
        };
        assert_eq!(snapshot.remaining_seconds(now), 90);
    }
}
