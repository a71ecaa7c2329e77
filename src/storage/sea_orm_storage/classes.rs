//! 班级存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::classes::{ActiveModel, Column, Entity as Classes, Relation};
use crate::entity::enrollments;
use crate::errors::Result;
use crate::models::{
    PaginationInfo, PaginationQuery,
    classes::{
        entities::Class,
        requests::{ClassListQuery, CreateClassRequest, UpdateClassRequest},
        responses::ClassListResponse,
    },
};
use crate::utils::sql::contains_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};

impl SeaOrmStorage {
    /// 创建班级
    pub async fn create_class_impl(&self, teacher_id: i64, req: CreateClassRequest) -> Result<Class> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            teacher_id: Set(teacher_id),
            name: Set(req.name),
            description: Set(req.description),
            cover_url: Set(req.cover_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建班级失败"))?;

        Ok(result.into_class())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询班级失败"))?;

        Ok(result.map(|m| m.into_class()))
    }

    /// 分页列出班级
    pub async fn list_classes_with_pagination_impl(
        &self,
        query: ClassListQuery,
    ) -> Result<ClassListResponse> {
        let (page, size) = PaginationQuery::normalized(query.page, query.size);

        let mut select = Classes::find();

        // 教师筛选
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        // 学生筛选：仅已选课的班级
        if let Some(student_id) = query.student_id {
            select = select
                .join(JoinType::InnerJoin, Relation::Enrollments.def())
                .filter(enrollments::Column::StudentId.eq(student_id));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let pattern = contains_pattern(search.trim());
            select = select.filter(Column::Name.like(pattern.clone()));
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("查询班级总数失败"))?;
        let pages = paginator
            .num_pages()
            .await
            .map_err(db_error("查询班级页数失败"))?;
        let classes = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("查询班级列表失败"))?;

        Ok(ClassListResponse {
            items: classes.into_iter().map(|m| m.into_class()).collect(),
            pagination: PaginationInfo::new(page, size, total, pages),
        })
    }

    /// 更新班级信息
    pub async fn update_class_impl(
        &self,
        class_id: i64,
        update: UpdateClassRequest,
    ) -> Result<Option<Class>> {
        if self.get_class_by_id_impl(class_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(class_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(cover_url) = update.cover_url {
            model.cover_url = Set(Some(cover_url));
        }
        if let Some(teacher_id) = update.teacher_id {
            model.teacher_id = Set(teacher_id);
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新班级失败"))?;

        Ok(Some(updated.into_class()))
    }

    /// 删除班级
    pub async fn delete_class_impl(&self, class_id: i64) -> Result<bool> {
        let result = Classes::delete_by_id(class_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除班级失败"))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计班级数量
    pub async fn count_classes_impl(&self, teacher_id: Option<i64>) -> Result<i64> {
        let mut select = Classes::find();
        if let Some(teacher_id) = teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        let count = select
            .count(&self.db)
            .await
            .map_err(db_error("统计班级数量失败"))?;

        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_class, seed_user};

    #[tokio::test]
    async fn test_list_by_teacher_and_student() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru_a = seed_user(&storage, "guru_a", UserRole::Guru).await;
        let guru_b = seed_user(&storage, "guru_b", UserRole::Guru).await;
        let murid = seed_user(&storage, "murid", UserRole::Murid).await;

        let class_a = seed_class(&storage, guru_a).await;
        seed_class(&storage, guru_b).await;
        storage.enroll_student_impl(class_a, murid).await.unwrap();

        let own = storage
            .list_classes_with_pagination_impl(ClassListQuery {
                teacher_id: Some(guru_b),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.items[0].teacher_id, guru_b);

        let enrolled = storage
            .list_classes_with_pagination_impl(ClassListQuery {
                student_id: Some(murid),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(enrolled.items.len(), 1);
        assert_eq!(enrolled.items[0].id, class_a);

        assert_eq!(storage.count_classes_impl(None).await.unwrap(), 2);
        assert_eq!(storage.count_classes_impl(Some(guru_a)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let class_id = seed_class(&storage, guru).await;

        let updated = storage
            .update_class_impl(
                class_id,
                UpdateClassRequest {
                    name: Some("Fisika".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Fisika");

        assert!(storage.delete_class_impl(class_id).await.unwrap());
        assert!(storage.get_class_by_id_impl(class_id).await.unwrap().is_none());
        assert!(!storage.delete_class_impl(class_id).await.unwrap());
    }
}
