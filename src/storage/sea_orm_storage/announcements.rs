//! 公告存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::announcements::{ActiveModel, Column, Entity as Announcements};
use crate::errors::Result;
use crate::models::announcements::{
    entities::Announcement,
    requests::{CreateAnnouncementRequest, UpdateAnnouncementRequest},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_announcement_impl(
        &self,
        class_id: i64,
        author_id: i64,
        req: CreateAnnouncementRequest,
    ) -> Result<Announcement> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(class_id),
            author_id: Set(author_id),
            title: Set(req.title),
            content: Set(req.content),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建公告失败"))?;

        Ok(result.into_announcement())
    }

    pub async fn get_announcement_by_id_impl(
        &self,
        announcement_id: i64,
    ) -> Result<Option<Announcement>> {
        let result = Announcements::find_by_id(announcement_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询公告失败"))?;

        Ok(result.map(|m| m.into_announcement()))
    }

    /// 班级公告，最新在前
    pub async fn list_announcements_impl(&self, class_id: i64) -> Result<Vec<Announcement>> {
        let rows = Announcements::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询公告列表失败"))?;

        Ok(rows.into_iter().map(|m| m.into_announcement()).collect())
    }

    pub async fn update_announcement_impl(
        &self,
        announcement_id: i64,
        update: UpdateAnnouncementRequest,
    ) -> Result<Option<Announcement>> {
        if self
            .get_announcement_by_id_impl(announcement_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(announcement_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(content) = update.content {
            model.content = Set(content);
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新公告失败"))?;

        Ok(Some(updated.into_announcement()))
    }

    pub async fn delete_announcement_impl(&self, announcement_id: i64) -> Result<bool> {
        let result = Announcements::delete_by_id(announcement_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除公告失败"))?;

        Ok(result.rows_affected > 0)
    }
}
