//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod announcements;
mod assignments;
mod attendance;
mod classes;
mod enrollments;
mod exams;
mod files;
mod materials;
mod mentors;
mod settings;
mod users;

use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

/// 数据库错误映射，唯一约束冲突保留为 Conflict
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(DbErr) -> LmsError {
    move |e| match LmsError::from(e) {
        LmsError::Conflict(msg) => LmsError::conflict(format!("{context}: {msg}")),
        other => LmsError::database_operation(format!("{context}: {}", other.message())),
    }
}

/// 关联查询得到的学生显示名
pub(crate) fn student_name(user: Option<crate::entity::users::Model>) -> String {
    user.map(|u| u.into_user().name().to_string())
        .unwrap_or_default()
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| LmsError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LmsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .pragma("temp_store", "memory");

        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("mmap_size", "536870912")
                .pragma("wal_autocheckpoint", "1000");
        }

        // 内存库的每个连接是独立数据库，只能保留单个常驻连接
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(pool_size)
                .min_connections(1)
                .test_before_acquire(true)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(timeout))
            .connect_with(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(5.min(pool_size))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LmsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 测试用内存数据库
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        Self::connect("sqlite::memory:", 1, 5)
            .await
            .expect("in-memory sqlite should open")
    }
}

// Storage trait 实现
use crate::models::{
    announcements::{
        entities::Announcement,
        requests::{CreateAnnouncementRequest, UpdateAnnouncementRequest},
    },
    assignments::{
        entities::{Assignment, AssignmentSubmission, SubmissionStatus},
        requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
        responses::SubmissionWithStudent,
    },
    attendance::{entities::AttendanceRecord, requests::AttendanceMark},
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
    enrollments::entities::{ClassMember, Enrollment},
    exams::{
        entities::{Exam, ExamQuestion, ExamSubmission},
        requests::{CreateExamRequest, CreateQuestionRequest, UpdateExamRequest, UpdateQuestionRequest},
        responses::ExamSubmissionWithStudent,
    },
    files::entities::{File, NewFile},
    materials::{
        entities::Material,
        requests::{CreateMaterialRequest, UpdateMaterialRequest},
    },
    mentors::{
        entities::Mentor,
        requests::{CreateMentorRequest, UpdateMentorRequest},
    },
    settings::entities::{Setting, SettingValueType},
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<i64> {
        self.count_users_by_role_impl(role).await
    }

    // 文件模块
    async fn create_file(&self, file: NewFile) -> Result<File> {
        self.create_file_impl(file).await
    }

    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>> {
        self.get_file_by_token_impl(token).await
    }

    // 班级模块
    async fn create_class(&self, teacher_id: i64, class: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(teacher_id, class).await
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        self.get_class_by_id_impl(class_id).await
    }

    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        self.list_classes_with_pagination_impl(query).await
    }

    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        self.update_class_impl(class_id, update).await
    }

    async fn delete_class(&self, class_id: i64) -> Result<bool> {
        self.delete_class_impl(class_id).await
    }

    async fn count_classes(&self, teacher_id: Option<i64>) -> Result<i64> {
        self.count_classes_impl(teacher_id).await
    }

    // 选课模块
    async fn enroll_student(&self, class_id: i64, student_id: i64) -> Result<Enrollment> {
        self.enroll_student_impl(class_id, student_id).await
    }

    async fn remove_enrollment(&self, class_id: i64, student_id: i64) -> Result<bool> {
        self.remove_enrollment_impl(class_id, student_id).await
    }

    async fn get_enrollment(&self, class_id: i64, student_id: i64) -> Result<Option<Enrollment>> {
        self.get_enrollment_impl(class_id, student_id).await
    }

    async fn list_class_members(&self, class_id: i64) -> Result<Vec<ClassMember>> {
        self.list_class_members_impl(class_id).await
    }

    async fn count_class_students(&self, class_id: i64) -> Result<i64> {
        self.count_class_students_impl(class_id).await
    }

    async fn count_teacher_students(&self, teacher_id: i64) -> Result<i64> {
        self.count_teacher_students_impl(teacher_id).await
    }

    async fn count_student_classes(&self, student_id: i64) -> Result<i64> {
        self.count_student_classes_impl(student_id).await
    }

    // 学习资料模块
    async fn create_material(
        &self,
        class_id: i64,
        created_by: i64,
        material: CreateMaterialRequest,
    ) -> Result<Material> {
        self.create_material_impl(class_id, created_by, material).await
    }

    async fn get_material_by_id(&self, material_id: i64) -> Result<Option<Material>> {
        self.get_material_by_id_impl(material_id).await
    }

    async fn list_materials(&self, class_id: i64) -> Result<Vec<Material>> {
        self.list_materials_impl(class_id).await
    }

    async fn update_material(
        &self,
        material_id: i64,
        update: UpdateMaterialRequest,
    ) -> Result<Option<Material>> {
        self.update_material_impl(material_id, update).await
    }

    async fn delete_material(&self, material_id: i64) -> Result<bool> {
        self.delete_material_impl(material_id).await
    }

    // 作业模块
    async fn create_assignment(
        &self,
        class_id: i64,
        created_by: i64,
        assignment: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        self.create_assignment_impl(class_id, created_by, assignment)
            .await
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }

    async fn list_assignments(&self, class_id: i64) -> Result<Vec<Assignment>> {
        self.list_assignments_impl(class_id).await
    }

    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(assignment_id, update).await
    }

    async fn delete_assignment(&self, assignment_id: i64) -> Result<bool> {
        self.delete_assignment_impl(assignment_id).await
    }

    async fn count_assignments(&self, teacher_id: Option<i64>) -> Result<i64> {
        self.count_assignments_impl(teacher_id).await
    }

    async fn count_pending_assignments(&self, student_id: i64) -> Result<i64> {
        self.count_pending_assignments_impl(student_id).await
    }

    async fn upsert_assignment_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
        file_url: String,
        status: SubmissionStatus,
    ) -> Result<AssignmentSubmission> {
        self.upsert_assignment_submission_impl(assignment_id, student_id, file_url, status)
            .await
    }

    async fn get_assignment_submission_by_id(
        &self,
        submission_id: i64,
    ) -> Result<Option<AssignmentSubmission>> {
        self.get_assignment_submission_by_id_impl(submission_id)
            .await
    }

    async fn get_student_assignment_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<AssignmentSubmission>> {
        self.get_student_assignment_submission_impl(assignment_id, student_id)
            .await
    }

    async fn list_assignment_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<SubmissionWithStudent>> {
        self.list_assignment_submissions_impl(assignment_id).await
    }

    async fn grade_assignment_submission(
        &self,
        submission_id: i64,
        grade: f64,
        comment: Option<String>,
        graded_by: i64,
    ) -> Result<Option<AssignmentSubmission>> {
        self.grade_assignment_submission_impl(submission_id, grade, comment, graded_by)
            .await
    }

    async fn count_ungraded_submissions(&self, teacher_id: i64) -> Result<i64> {
        self.count_ungraded_submissions_impl(teacher_id).await
    }

    // 考试模块
    async fn create_exam(
        &self,
        class_id: i64,
        created_by: i64,
        exam: CreateExamRequest,
    ) -> Result<Exam> {
        self.create_exam_impl(class_id, created_by, exam).await
    }

    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>> {
        self.get_exam_by_id_impl(exam_id).await
    }

    async fn list_exams(&self, class_id: i64) -> Result<Vec<Exam>> {
        self.list_exams_impl(class_id).await
    }

    async fn update_exam(&self, exam_id: i64, update: UpdateExamRequest) -> Result<Option<Exam>> {
        self.update_exam_impl(exam_id, update).await
    }

    async fn delete_exam(&self, exam_id: i64) -> Result<bool> {
        self.delete_exam_impl(exam_id).await
    }

    async fn count_exams(&self, teacher_id: Option<i64>) -> Result<i64> {
        self.count_exams_impl(teacher_id).await
    }

    async fn count_pending_exams(&self, student_id: i64) -> Result<i64> {
        self.count_pending_exams_impl(student_id).await
    }

    async fn create_question(
        &self,
        exam_id: i64,
        question: CreateQuestionRequest,
    ) -> Result<ExamQuestion> {
        self.create_question_impl(exam_id, question).await
    }

    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<ExamQuestion>> {
        self.get_question_by_id_impl(question_id).await
    }

    async fn list_questions(&self, exam_id: i64) -> Result<Vec<ExamQuestion>> {
        self.list_questions_impl(exam_id).await
    }

    async fn update_question(
        &self,
        question_id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<ExamQuestion>> {
        self.update_question_impl(question_id, update).await
    }

    async fn delete_question(&self, question_id: i64) -> Result<bool> {
        self.delete_question_impl(question_id).await
    }

    async fn create_exam_submission(&self, submission: &ExamSubmission) -> Result<()> {
        self.create_exam_submission_impl(submission).await
    }

    async fn get_exam_submission(
        &self,
        exam_id: i64,
        student_id: i64,
    ) -> Result<Option<ExamSubmission>> {
        self.get_exam_submission_impl(exam_id, student_id).await
    }

    async fn list_exam_submissions(&self, exam_id: i64) -> Result<Vec<ExamSubmissionWithStudent>> {
        self.list_exam_submissions_impl(exam_id).await
    }

    async fn set_exam_essay_score(
        &self,
        exam_id: i64,
        student_id: i64,
        essay_score: i32,
        final_grade: i32,
    ) -> Result<Option<ExamSubmission>> {
        self.set_exam_essay_score_impl(exam_id, student_id, essay_score, final_grade)
            .await
    }

    // 考勤模块
    async fn list_attendance_records(
        &self,
        class_id: i64,
        date: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        self.list_attendance_records_impl(class_id, date).await
    }

    async fn upsert_attendance_records(
        &self,
        class_id: i64,
        date: &str,
        marks: &[AttendanceMark],
        recorded_by: i64,
    ) -> Result<Vec<AttendanceRecord>> {
        self.upsert_attendance_records_impl(class_id, date, marks, recorded_by)
            .await
    }

    async fn list_student_attendance(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<Vec<AttendanceRecord>> {
        self.list_student_attendance_impl(class_id, student_id)
            .await
    }

    // 公告模块
    async fn create_announcement(
        &self,
        class_id: i64,
        author_id: i64,
        announcement: CreateAnnouncementRequest,
    ) -> Result<Announcement> {
        self.create_announcement_impl(class_id, author_id, announcement)
            .await
    }

    async fn get_announcement_by_id(&self, announcement_id: i64) -> Result<Option<Announcement>> {
        self.get_announcement_by_id_impl(announcement_id).await
    }

    async fn list_announcements(&self, class_id: i64) -> Result<Vec<Announcement>> {
        self.list_announcements_impl(class_id).await
    }

    async fn update_announcement(
        &self,
        announcement_id: i64,
        update: UpdateAnnouncementRequest,
    ) -> Result<Option<Announcement>> {
        self.update_announcement_impl(announcement_id, update).await
    }

    async fn delete_announcement(&self, announcement_id: i64) -> Result<bool> {
        self.delete_announcement_impl(announcement_id).await
    }

    // 导师模块
    async fn list_mentors(&self) -> Result<Vec<Mentor>> {
        self.list_mentors_impl().await
    }

    async fn create_mentor(&self, mentor: CreateMentorRequest) -> Result<Mentor> {
        self.create_mentor_impl(mentor).await
    }

    async fn update_mentor(
        &self,
        mentor_id: i64,
        update: UpdateMentorRequest,
    ) -> Result<Option<Mentor>> {
        self.update_mentor_impl(mentor_id, update).await
    }

    async fn delete_mentor(&self, mentor_id: i64) -> Result<bool> {
        self.delete_mentor_impl(mentor_id).await
    }

    // 设置模块
    async fn list_settings(&self) -> Result<Vec<Setting>> {
        self.list_settings_impl().await
    }

    async fn get_setting(&self, key: &str) -> Result<Option<Setting>> {
        self.get_setting_impl(key).await
    }

    async fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        value_type: SettingValueType,
        description: Option<String>,
        updated_by: Option<i64>,
    ) -> Result<Setting> {
        self.upsert_setting_impl(key, value, value_type, description, updated_by)
            .await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use crate::models::users::{entities::UserRole, requests::CreateUserRequest};

    /// 创建测试用户，返回 ID
    pub(crate) async fn seed_user(storage: &SeaOrmStorage, username: &str, role: UserRole) -> i64 {
        storage
            .create_user_impl(CreateUserRequest {
                username: username.to_string(),
                email: format!("{username}@kelas.test"),
                password: "hash".to_string(),
                role,
                display_name: None,
                avatar_url: None,
            })
            .await
            .expect("seed user")
            .id
    }

    /// 创建测试班级，返回 ID
    pub(crate) async fn seed_class(storage: &SeaOrmStorage, teacher_id: i64) -> i64 {
        use crate::models::classes::requests::CreateClassRequest;

        storage
            .create_class_impl(
                teacher_id,
                CreateClassRequest {
                    teacher_id: None,
                    name: "Matematika".to_string(),
                    description: None,
                    cover_url: None,
                },
            )
            .await
            .expect("seed class")
            .id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("kelas.db").unwrap(),
            "sqlite://kelas.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url(":memory:").unwrap(),
            "sqlite::memory:"
        );
        assert!(SeaOrmStorage::build_database_url("postgres://u@h/db").is_ok());
        assert!(SeaOrmStorage::build_database_url("ftp://nope").is_err());
    }

    #[tokio::test]
    async fn test_migrations_seed_settings() {
        let storage = SeaOrmStorage::in_memory().await;
        let name = storage.get_setting_impl("site.name").await.unwrap();
        assert_eq!(name.map(|s| s.value).as_deref(), Some("Kelas"));
    }
}
