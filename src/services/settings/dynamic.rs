//! 动态配置缓存
//!
//! 启动时从 settings 表加载，管理员修改设置后热更新。
//! 未设置的键回退到配置文件。

use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::config::AppConfig;

static DYNAMIC_CONFIG: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

pub struct DynamicConfig;

impl DynamicConfig {
    fn cache() -> &'static RwLock<HashMap<String, String>> {
        DYNAMIC_CONFIG.get_or_init(|| RwLock::new(HashMap::new()))
    }

    /// 用数据库中的设置整体替换缓存
    pub async fn init(settings: Vec<(String, String)>) {
        let mut guard = Self::cache().write().await;
        guard.clear();
        guard.extend(settings);
        tracing::info!("Dynamic config loaded with {} settings", guard.len());
    }

    pub async fn update(key: &str, value: &str) {
        Self::cache()
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        tracing::debug!("Dynamic config updated: {} = {}", key, value);
    }

    async fn get_string(key: &str) -> Option<String> {
        Self::cache().read().await.get(key).cloned()
    }

    /// 单文件上传上限（字节）
    pub async fn upload_max_size() -> usize {
        Self::get_string("upload.max_size")
            .await
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or_else(|| AppConfig::get().upload.max_size)
    }

    /// 允许上传的扩展名，如 `[".pdf", ".png"]`
    pub async fn upload_allowed_types() -> Vec<String> {
        Self::get_string("upload.allowed_types")
            .await
            .and_then(|v| serde_json::from_str(&v).ok())
            .unwrap_or_else(|| AppConfig::get().upload.allowed_types.clone())
    }

    pub async fn site_name() -> String {
        Self::get_string("site.name")
            .await
            .unwrap_or_else(|| AppConfig::get().app.system_name.clone())
    }
}
