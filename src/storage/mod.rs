use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户，password 字段需为哈希后的值
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 按角色统计用户数量
    async fn count_users_by_role(&self, role: UserRole) -> Result<i64>;

    /// 文件管理方法
    // 保存上传记录，返回带下载 token 的文件信息
    async fn create_file(&self, file: NewFile) -> Result<File>;
    // 通过唯一 token 获取文件信息
    async fn get_file_by_token(&self, token: &str) -> Result<Option<File>>;

    /// 班级管理方法
    // 创建班级，teacher_id 由服务层确定
    async fn create_class(&self, teacher_id: i64, class: CreateClassRequest) -> Result<Class>;
    // 通过ID获取班级信息
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;
    // 列出班级，可按教师或学生筛选
    async fn list_classes_with_pagination(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse>;
    // 更新班级信息
    async fn update_class(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>>;
    // 删除班级（级联删除班级内容）
    async fn delete_class(&self, class_id: i64) -> Result<bool>;
    // 统计班级数量，可限定教师
    async fn count_classes(&self, teacher_id: Option<i64>) -> Result<i64>;

    /// 选课管理方法
    // 学生加入班级，重复选课返回 Conflict
    async fn enroll_student(&self, class_id: i64, student_id: i64) -> Result<Enrollment>;
    // 将学生移出班级
    async fn remove_enrollment(&self, class_id: i64, student_id: i64) -> Result<bool>;
    // 获取学生在班级中的选课记录
    async fn get_enrollment(&self, class_id: i64, student_id: i64) -> Result<Option<Enrollment>>;
    // 列出班级成员
    async fn list_class_members(&self, class_id: i64) -> Result<Vec<ClassMember>>;
    // 统计班级学生数
    async fn count_class_students(&self, class_id: i64) -> Result<i64>;
    // 统计教师所有班级中的不同学生数
    async fn count_teacher_students(&self, teacher_id: i64) -> Result<i64>;
    // 统计学生已选班级数
    async fn count_student_classes(&self, student_id: i64) -> Result<i64>;

    /// 学习资料方法
    async fn create_material(
        &self,
        class_id: i64,
        created_by: i64,
        material: CreateMaterialRequest,
    ) -> Result<Material>;
    async fn get_material_by_id(&self, material_id: i64) -> Result<Option<Material>>;
    async fn list_materials(&self, class_id: i64) -> Result<Vec<Material>>;
    async fn update_material(
        &self,
        material_id: i64,
        update: UpdateMaterialRequest,
    ) -> Result<Option<Material>>;
    async fn delete_material(&self, material_id: i64) -> Result<bool>;

    /// 作业管理方法
    async fn create_assignment(
        &self,
        class_id: i64,
        created_by: i64,
        assignment: CreateAssignmentRequest,
    ) -> Result<Assignment>;
    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    async fn list_assignments(&self, class_id: i64) -> Result<Vec<Assignment>>;
    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>>;
    async fn delete_assignment(&self, assignment_id: i64) -> Result<bool>;
    // 统计作业数量，可限定教师的班级
    async fn count_assignments(&self, teacher_id: Option<i64>) -> Result<i64>;
    // 统计学生尚未提交的作业数
    async fn count_pending_assignments(&self, student_id: i64) -> Result<i64>;

    /// 作业提交方法
    // 创建或替换 (作业, 学生) 唯一的提交，并清除已有评分
    async fn upsert_assignment_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
        file_url: String,
        status: SubmissionStatus,
    ) -> Result<AssignmentSubmission>;
    async fn get_assignment_submission_by_id(
        &self,
        submission_id: i64,
    ) -> Result<Option<AssignmentSubmission>>;
    async fn get_student_assignment_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<AssignmentSubmission>>;
    async fn list_assignment_submissions(
        &self,
        assignment_id: i64,
    ) -> Result<Vec<SubmissionWithStudent>>;
    async fn grade_assignment_submission(
        &self,
        submission_id: i64,
        grade: f64,
        comment: Option<String>,
        graded_by: i64,
    ) -> Result<Option<AssignmentSubmission>>;
    // 统计教师班级中未评分的提交数
    async fn count_ungraded_submissions(&self, teacher_id: i64) -> Result<i64>;

    /// 考试管理方法
    async fn create_exam(
        &self,
        class_id: i64,
        created_by: i64,
        exam: CreateExamRequest,
    ) -> Result<Exam>;
    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>>;
    async fn list_exams(&self, class_id: i64) -> Result<Vec<Exam>>;
    async fn update_exam(&self, exam_id: i64, update: UpdateExamRequest) -> Result<Option<Exam>>;
    async fn delete_exam(&self, exam_id: i64) -> Result<bool>;
    async fn count_exams(&self, teacher_id: Option<i64>) -> Result<i64>;
    // 统计学生尚未提交的考试数
    async fn count_pending_exams(&self, student_id: i64) -> Result<i64>;

    /// 考试题目方法
    async fn create_question(
        &self,
        exam_id: i64,
        question: CreateQuestionRequest,
    ) -> Result<ExamQuestion>;
    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<ExamQuestion>>;
    // 按创建顺序列出题目
    async fn list_questions(&self, exam_id: i64) -> Result<Vec<ExamQuestion>>;
    async fn update_question(
        &self,
        question_id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Option<ExamQuestion>>;
    async fn delete_question(&self, question_id: i64) -> Result<bool>;

    /// 考试提交方法
    // 仅在不存在时创建，已存在返回 Conflict
    async fn create_exam_submission(&self, submission: &ExamSubmission) -> Result<()>;
    async fn get_exam_submission(
        &self,
        exam_id: i64,
        student_id: i64,
    ) -> Result<Option<ExamSubmission>>;
    async fn list_exam_submissions(&self, exam_id: i64) -> Result<Vec<ExamSubmissionWithStudent>>;
    async fn set_exam_essay_score(
        &self,
        exam_id: i64,
        student_id: i64,
        essay_score: i32,
        final_grade: i32,
    ) -> Result<Option<ExamSubmission>>;

    /// 考勤方法
    async fn list_attendance_records(
        &self,
        class_id: i64,
        date: &str,
    ) -> Result<Vec<AttendanceRecord>>;
    // 按 (班级, 日期, 学生) 写入或覆盖
    async fn upsert_attendance_records(
        &self,
        class_id: i64,
        date: &str,
        marks: &[AttendanceMark],
        recorded_by: i64,
    ) -> Result<Vec<AttendanceRecord>>;
    async fn list_student_attendance(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<Vec<AttendanceRecord>>;

    /// 公告方法
    async fn create_announcement(
        &self,
        class_id: i64,
        author_id: i64,
        announcement: CreateAnnouncementRequest,
    ) -> Result<Announcement>;
    async fn get_announcement_by_id(&self, announcement_id: i64) -> Result<Option<Announcement>>;
    async fn list_announcements(&self, class_id: i64) -> Result<Vec<Announcement>>;
    async fn update_announcement(
        &self,
        announcement_id: i64,
        update: UpdateAnnouncementRequest,
    ) -> Result<Option<Announcement>>;
    async fn delete_announcement(&self, announcement_id: i64) -> Result<bool>;

    /// 导师方法
    async fn list_mentors(&self) -> Result<Vec<Mentor>>;
    async fn create_mentor(&self, mentor: CreateMentorRequest) -> Result<Mentor>;
    async fn update_mentor(
        &self,
        mentor_id: i64,
        update: UpdateMentorRequest,
    ) -> Result<Option<Mentor>>;
    async fn delete_mentor(&self, mentor_id: i64) -> Result<bool>;

    /// 站点设置方法
    async fn list_settings(&self) -> Result<Vec<Setting>>;
    async fn get_setting(&self, key: &str) -> Result<Option<Setting>>;
    async fn upsert_setting(
        &self,
        key: &str,
        value: &str,
        value_type: SettingValueType,
        description: Option<String>,
        updated_by: Option<i64>,
    ) -> Result<Setting>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
