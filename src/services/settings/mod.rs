mod dynamic;

pub use dynamic::DynamicConfig;

use std::collections::BTreeMap;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::models::settings::{
    entities::{Setting, SettingValueType},
    requests::UpsertSettingRequest,
    responses::{AdminSettingsListResponse, PublicSettingsResponse, SettingResponse},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, storage_failure};

const VALUE_MAX: usize = 10_000;

super::define_service!(
    /// 站点设置
    SettingService
);

/// 只保留公开键
pub(crate) fn public_view(settings: Vec<Setting>) -> BTreeMap<String, String> {
    settings
        .into_iter()
        .filter(Setting::is_public)
        .map(|s| (s.key, s.value))
        .collect()
}

/// 已有设置的类型不可修改；新键未指定类型时为字符串
pub(crate) fn resolve_value_type(
    existing: Option<SettingValueType>,
    requested: Option<SettingValueType>,
) -> Result<SettingValueType, String> {
    match (existing, requested) {
        (Some(current), Some(wanted)) if current != wanted => Err(format!(
            "Setting type is {current} and cannot be changed to {wanted}"
        )),
        (Some(current), _) => Ok(current),
        (None, wanted) => Ok(wanted.unwrap_or(SettingValueType::String)),
    }
}

impl SettingService {
    pub async fn public_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let settings = storage
            .list_settings()
            .await
            .map_err(storage_failure("Failed to list settings"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            PublicSettingsResponse {
                settings: public_view(settings),
            },
            "Settings retrieved successfully",
        )))
    }

    pub async fn admin_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let settings = storage
            .list_settings()
            .await
            .map_err(storage_failure("Failed to list settings"))?;

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            AdminSettingsListResponse { settings },
            "Admin settings retrieved successfully",
        )))
    }

    pub async fn upsert_setting(
        &self,
        request: &HttpRequest,
        key: String,
        body: UpsertSettingRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        let admin = current_user(request)?;

        let value = body.value.trim().to_string();
        if value.chars().count() > VALUE_MAX {
            return Err(bad_request(
                ErrorCode::SettingInvalid,
                format!("Value must be at most {VALUE_MAX} characters"),
            ));
        }

        let existing = storage
            .get_setting(&key)
            .await
            .map_err(storage_failure("Failed to get setting"))?;
        let value_type = resolve_value_type(existing.as_ref().map(|s| s.value_type), body.value_type)
            .map_err(|msg| bad_request(ErrorCode::SettingInvalid, msg))?;
        value_type
            .validate(&value)
            .map_err(|msg| bad_request(ErrorCode::SettingInvalid, msg))?;

        let description = body
            .description
            .or_else(|| existing.and_then(|s| s.description));
        let setting = storage
            .upsert_setting(&key, &value, value_type, description, Some(admin.id))
            .await
            .map_err(storage_failure("Failed to save setting"))?;

        DynamicConfig::update(&setting.key, &setting.value).await;
        info!("Setting {} updated by {}", setting.key, admin.id);

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            SettingResponse { setting },
            "Setting updated successfully",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(key: &str, value: &str) -> Setting {
        Setting {
            key: key.into(),
            value: value.into(),
            value_type: SettingValueType::String,
            description: None,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    #[test]
    fn test_public_view_hides_internal_keys() {
        let view = public_view(vec![
            setting("site.name", "Kelas Impian"),
            setting("contact.phone", "0812"),
            setting("upload.max_size", "1048576"),
        ]);
        assert_eq!(view.len(), 2);
        assert_eq!(view["site.name"], "Kelas Impian");
        assert!(!view.contains_key("upload.max_size"));
    }

    #[test]
    fn test_value_type_is_fixed_once_set() {
        use SettingValueType::*;
        assert_eq!(resolve_value_type(None, None).unwrap(), String);
        assert_eq!(resolve_value_type(None, Some(Integer)).unwrap(), Integer);
        assert_eq!(resolve_value_type(Some(JsonArray), None).unwrap(), JsonArray);
        assert!(resolve_value_type(Some(Integer), Some(Boolean)).is_err());
    }

    #[tokio::test]
    async fn test_dynamic_config_fallback_and_update() {
        crate::config::AppConfig::init().ok();
        DynamicConfig::update("upload.allowed_types", r#"[".pdf"]"#).await;
        assert_eq!(DynamicConfig::upload_allowed_types().await, vec![".pdf"]);
        DynamicConfig::update("upload.max_size", "0").await;
        assert_eq!(
            DynamicConfig::upload_max_size().await,
            crate::config::AppConfig::get().upload.max_size
        );
    }
}
