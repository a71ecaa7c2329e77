//! 站点设置存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::settings::{ActiveModel, Column, Entity as Settings};
use crate::errors::Result;
use crate::models::settings::entities::{Setting, SettingValueType};
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn list_settings_impl(&self) -> Result<Vec<Setting>> {
        let rows = Settings::find()
            .order_by_asc(Column::Key)
            .all(&self.db)
            .await
            .map_err(db_error("查询设置失败"))?;

        Ok(rows.into_iter().map(|m| m.into_setting()).collect())
    }

    pub async fn get_setting_impl(&self, key: &str) -> Result<Option<Setting>> {
        let result = Settings::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(db_error("查询设置失败"))?;

        Ok(result.map(|m| m.into_setting()))
    }

    /// 按键写入，description 为空时保留原值
    pub async fn upsert_setting_impl(
        &self,
        key: &str,
        value: &str,
        value_type: SettingValueType,
        description: Option<String>,
        updated_by: Option<i64>,
    ) -> Result<Setting> {
        let mut update_columns = vec![
            Column::Value,
            Column::ValueType,
            Column::UpdatedAt,
            Column::UpdatedBy,
        ];
        if description.is_some() {
            update_columns.push(Column::Description);
        }

        let model = ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            value_type: Set(value_type.to_string()),
            description: Set(description),
            updated_at: Set(chrono::Utc::now().timestamp()),
            updated_by: Set(updated_by),
        };

        Settings::insert(model)
            .on_conflict(
                OnConflict::column(Column::Key)
                    .update_columns(update_columns)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(db_error("保存设置失败"))?;

        self.get_setting_impl(key).await?.ok_or_else(|| {
            crate::errors::LmsError::not_found(format!("设置 {key} 保存后未找到"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_keeps_description() {
        let storage = SeaOrmStorage::in_memory().await;
        let before = storage.get_setting_impl("site.name").await.unwrap().unwrap();

        let after = storage
            .upsert_setting_impl("site.name", "Kelas Pintar", SettingValueType::String, None, Some(1))
            .await
            .unwrap();
        assert_eq!(after.value, "Kelas Pintar");
        assert_eq!(after.description, before.description);
        assert_eq!(after.updated_by, Some(1));

        let created = storage
            .upsert_setting_impl(
                "site.footer",
                "Hak cipta",
                SettingValueType::String,
                Some("Teks footer".to_string()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(created.description.as_deref(), Some("Teks footer"));
    }
}
