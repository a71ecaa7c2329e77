//! 站点设置实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
    pub value_type: String,
    pub description: Option<String>,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_setting(self) -> crate::models::settings::entities::Setting {
        use crate::models::settings::entities::{Setting, SettingValueType};

        Setting {
            key: self.key,
            value: self.value,
            value_type: self.value_type.parse().unwrap_or(SettingValueType::String),
            description: self.description,
            updated_at: super::to_datetime(self.updated_at),
            updated_by: self.updated_by,
        }
    }
}
