//! 学习资料存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::materials::{ActiveModel, Column, Entity as Materials};
use crate::errors::Result;
use crate::models::materials::{
    entities::Material,
    requests::{CreateMaterialRequest, UpdateMaterialRequest},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_material_impl(
        &self,
        class_id: i64,
        created_by: i64,
        req: CreateMaterialRequest,
    ) -> Result<Material> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            class_id: Set(class_id),
            title: Set(req.title),
            description: Set(req.description),
            kind: Set(req.kind.to_string()),
            url: Set(req.url),
            text_content: Set(req.text_content),
            cover_url: Set(req.cover_url),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(db_error("创建资料失败"))?;

        Ok(result.into_material())
    }

    pub async fn get_material_by_id_impl(&self, material_id: i64) -> Result<Option<Material>> {
        let result = Materials::find_by_id(material_id)
            .one(&self.db)
            .await
            .map_err(db_error("查询资料失败"))?;

        Ok(result.map(|m| m.into_material()))
    }

    /// 班级资料，最新在前
    pub async fn list_materials_impl(&self, class_id: i64) -> Result<Vec<Material>> {
        let rows = Materials::find()
            .filter(Column::ClassId.eq(class_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询资料列表失败"))?;

        Ok(rows.into_iter().map(|m| m.into_material()).collect())
    }

    pub async fn update_material_impl(
        &self,
        material_id: i64,
        update: UpdateMaterialRequest,
    ) -> Result<Option<Material>> {
        if self.get_material_by_id_impl(material_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(material_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(title) = update.title {
            model.title = Set(title);
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(kind) = update.kind {
            model.kind = Set(kind.to_string());
        }
        if let Some(url) = update.url {
            model.url = Set(Some(url));
        }
        if let Some(text_content) = update.text_content {
            model.text_content = Set(Some(text_content));
        }
        if let Some(cover_url) = update.cover_url {
            model.cover_url = Set(Some(cover_url));
        }

        let updated = model.update(&self.db).await.map_err(db_error("更新资料失败"))?;

        Ok(Some(updated.into_material()))
    }

    pub async fn delete_material_impl(&self, material_id: i64) -> Result<bool> {
        let result = Materials::delete_by_id(material_id)
            .exec(&self.db)
            .await
            .map_err(db_error("删除资料失败"))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::materials::entities::MaterialKind;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_class, seed_user};

    #[tokio::test]
    async fn test_materials_cascade_with_class() {
        let storage = SeaOrmStorage::in_memory().await;
        let guru = seed_user(&storage, "guru", UserRole::Guru).await;
        let class_id = seed_class(&storage, guru).await;

        let material = storage
            .create_material_impl(
                class_id,
                guru,
                CreateMaterialRequest {
                    title: "Bab 1".to_string(),
                    description: None,
                    kind: MaterialKind::Text,
                    url: None,
                    text_content: Some("Pengantar".to_string()),
                    cover_url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(material.kind, MaterialKind::Text);

        let updated = storage
            .update_material_impl(
                material.id,
                UpdateMaterialRequest {
                    title: Some("Bab 1 (revisi)".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Bab 1 (revisi)");
        assert_eq!(updated.text_content.as_deref(), Some("Pengantar"));

        storage.delete_class_impl(class_id).await.unwrap();
        assert!(storage.list_materials_impl(class_id).await.unwrap().is_empty());
    }
}
