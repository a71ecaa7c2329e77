//! 选课存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::classes;
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments, Relation};
use crate::entity::users::Entity as Users;
use crate::errors::Result;
use crate::models::enrollments::entities::{ClassMember, Enrollment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};

impl SeaOrmStorage {
    /// 学生加入班级，(班级, 学生) 唯一
    pub async fn enroll_student_impl(&self, class_id: i64, student_id: i64) -> Result<Enrollment> {
        let model = ActiveModel {
            class_id: Set(class_id),
            student_id: Set(student_id),
            enrolled_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("选课失败"))?;

        Ok(result.into_enrollment())
    }

    /// 移出班级
    pub async fn remove_enrollment_impl(&self, class_id: i64, student_id: i64) -> Result<bool> {
        let result = Enrollments::delete_many()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .exec(&self.db)
            .await
            .map_err(db_error("退出班级失败"))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn get_enrollment_impl(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        let result = Enrollments::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(db_error("查询选课记录失败"))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 班级成员，按选课时间排序
    pub async fn list_class_members_impl(&self, class_id: i64) -> Result<Vec<ClassMember>> {
        let rows = Enrollments::find()
            .filter(Column::ClassId.eq(class_id))
            .find_also_related(Users)
            .order_by_asc(Column::EnrolledAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询班级成员失败"))?;

        Ok(rows
            .into_iter()
            .filter_map(|(enrollment, user)| {
                let user = user?;
                Some(ClassMember {
                    enrollment_id: enrollment.id,
                    student_id: enrollment.student_id,
                    username: user.username,
                    email: user.email,
                    display_name: user.display_name,
                    avatar_url: user.avatar_url,
                    enrolled_at: crate::entity::to_datetime(enrollment.enrolled_at),
                })
            })
            .collect())
    }

    pub async fn count_class_students_impl(&self, class_id: i64) -> Result<i64> {
        let count = Enrollments::find()
            .filter(Column::ClassId.eq(class_id))
            .count(&self.db)
            .await
            .map_err(db_error("统计班级人数失败"))?;

        Ok(count as i64)
    }

    /// 教师所有班级中的不同学生数
    pub async fn count_teacher_students_impl(&self, teacher_id: i64) -> Result<i64> {
        let students: Vec<i64> = Enrollments::find()
            .select_only()
            .column(Column::StudentId)
            .distinct()
            .join(JoinType::InnerJoin, Relation::Class.def())
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_error("统计教师学生数失败"))?;

        Ok(students.len() as i64)
    }

    pub async fn count_student_classes_impl(&self, student_id: i64) -> Result<i64> {
        let count = Enrollments::find()
            .filter(Column::StudentId.eq(student_id))
            .count(&self.db)
            .await
            .map_err(db_error("统计已选班级失败"))?;

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_class, seed_user};

    #[tokio::test]
    async fn test_duplicate_enrollment_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;
        let class_id = seed_class(&storage, guru).await;

        storage.enroll_student_impl(class_id, murid).await.unwrap();
        let err = storage.enroll_student_impl(class_id, murid).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(storage.count_class_students_impl(class_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_members_and_removal() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let a = seed_user(&storage, "ani", UserRole::Murid).await;
        let b = seed_user(&storage, "bayu", UserRole::Murid).await;
        let class_1 = seed_class(&storage, guru).await;
        let class_2 = seed_class(&storage, guru).await;

        storage.enroll_student_impl(class_1, a).await.unwrap();
        storage.enroll_student_impl(class_1, b).await.unwrap();
        storage.enroll_student_impl(class_2, a).await.unwrap();

        let members = storage.list_class_members_impl(class_1).await.unwrap();
        let names: Vec<_> = members.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["ani", "bayu"]);

        assert_eq!(storage.count_teacher_students_impl(guru).await.unwrap(), 2);
        assert_eq!(storage.count_student_classes_impl(a).await.unwrap(), 2);

        assert!(storage.remove_enrollment_impl(class_1, b).await.unwrap());
        assert!(storage.get_enrollment_impl(class_1, b).await.unwrap().is_none());
        assert!(!storage.remove_enrollment_impl(class_1, b).await.unwrap());
    }
}
