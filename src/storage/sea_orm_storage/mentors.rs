//! 导师存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::mentors::{ActiveModel, Column, Entity as Mentors};
use crate::errors::Result;
use crate::models::mentors::{
    entities::Mentor,
    requests::{CreateMentorRequest, UpdateMentorRequest},
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    /// 按 sort_order 升序
    pub async fn list_mentors_impl(&self) -> Result<Vec<Mentor>> {
        let rows = Mentors::find()
            .order_by_asc(Column::SortOrder)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询导师列表失败"))?;

        Ok(rows.into_iter().map(|m| m.into_mentor()).collect())
    }

    pub async fn get_mentor_by_id_impl(&self, mentor_id: i64) -> Result<Option<Mentor>> {
        let result = Mentors::find_by_id(mentor_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询导师失败"))?;

        Ok(result.map(|m| m.into_mentor()))
    }

    pub async fn create_mentor_impl(&self, req: CreateMentorRequest) -> Result<Mentor> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name),
            title: Set(req.title),
            bio: Set(req.bio),
            photo_url: Set(req.photo_url),
            sort_order: Set(req.sort_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建导师失败"))?;

        Ok(result.into_mentor())
    }

    pub async fn update_mentor_impl(
        &self,
        mentor_id: i64,
        update: UpdateMentorRequest,
    ) -> Result<Option<Mentor>> {
        if self.get_mentor_by_id_impl(mentor_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(mentor_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name);
        }
        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(bio) = update.bio {
            model.bio = Set(Some(bio));
        }
        if let Some(photo_url) = update.photo_url {
            model.photo_url = Set(Some(photo_url));
        }
        if let Some(sort_order) = update.sort_order {
            model.sort_order = Set(sort_order);
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新导师失败"))?;

        Ok(Some(updated.into_mentor()))
    }

    pub async fn delete_mentor_impl(&self, mentor_id: i64) -> Result<bool> {
        let result = Mentors::delete_by_id(mentor_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除导师失败"))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentor(name: &str, sort_order: i32) -> CreateMentorRequest {
        CreateMentorRequest {
            name: name.to_string(),
            title: "Pengajar".to_string(),
            bio: None,
            photo_url: None,
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_list_follows_sort_order() {
        let storage = SeaOrmStorage::in_memory().await;
        storage.create_mentor_impl(mentor("Rina", 2)).await.unwrap();
        storage.create_mentor_impl(mentor("Dedi", 1)).await.unwrap();

        let names: Vec<_> = storage
            .list_mentors_impl()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Dedi", "Rina"]);
    }
}
