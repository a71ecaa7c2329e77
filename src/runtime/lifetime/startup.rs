use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{LmsError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::services::{DynamicConfig, ExamSessionRegistry};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_CACHE: &str = "moka";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub exam_sessions: Arc<ExamSessionRegistry>,
}

async fn build_cache(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let Some(constructor) = get_object_cache_plugin(name) else {
        warn!("Cache backend '{}' not found in registry", name);
        return None;
    };
    match constructor().await {
        Ok(cache) => {
            warn!("Cache backend '{}' initialized", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create '{}' cache: {}", name, e);
            None
        }
    }
}

/// 按配置创建缓存，失败时回退到进程内缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = AppConfig::get().cache.cache_type.as_str();
    if let Some(cache) = build_cache(cache_type).await {
        return Ok(cache);
    }
    if cache_type != FALLBACK_CACHE {
        warn!("Falling back to {} cache", FALLBACK_CACHE);
        if let Some(cache) = build_cache(FALLBACK_CACHE).await {
            return Ok(cache);
        }
    }
    Err(LmsError::cache_connection(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

fn generate_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// 从 settings 表加载动态配置，失败时全部回退到配置文件
async fn load_dynamic_config(storage: &Arc<dyn Storage>) {
    match storage.list_settings().await {
        Ok(settings) => {
            DynamicConfig::init(settings.into_iter().map(|s| (s.key, s.value)).collect()).await;
        }
        Err(e) => {
            warn!("Failed to load settings: {}, using configuration defaults", e);
            DynamicConfig::init(Vec::new()).await;
        }
    }
}

/// 没有任何管理员时创建默认 admin 账号
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users_by_role(UserRole::Admin).await {
        Ok(count) if count > 0 => {
            debug!("Found {} admin account(s), skipping seed", count);
            return;
        }
        Ok(_) => info!("No admin account found, creating default admin"),
        Err(e) => {
            warn!("Failed to count admins: {}, skipping seed", e);
            return;
        }
    }

    let password = std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| {
            let generated = generate_password(16);
            warn!("ADMIN_PASSWORD not set, generated admin password: {}", generated);
            warn!("Save it now, it will not be shown again");
            generated
        });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping seed", e);
            return;
        }
    };

    let request = CreateUserRequest {
        username: "admin".to_string(),
        email: "admin@localhost".to_string(),
        password: password_hash,
        role: UserRole::Admin,
        display_name: Some("Administrator".to_string()),
        avatar_url: None,
    };

    match storage.create_user(request).await {
        Ok(user) => info!("Default admin created (id: {})", user.id),
        Err(e) => warn!("Failed to create default admin: {}", e),
    }
}

/// 准备服务启动所需的共享状态
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AppConfig::get();

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    load_dynamic_config(&storage).await;
    seed_admin(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");

    let exam_sessions =
        ExamSessionRegistry::new(storage.clone(), config.exam.submit_grace_seconds);
    debug!(
        "Exam session registry ready (grace: {}s)",
        config.exam.submit_grace_seconds
    );

    StartupContext {
        storage,
        cache,
        exam_sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    #[test]
    fn test_generated_password() {
        let pwd = generate_password(16);
        assert_eq!(pwd.chars().count(), 16);
        assert!(pwd.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn test_seed_admin_runs_once() {
        AppConfig::init().ok();
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);

        seed_admin(&storage).await;
        seed_admin(&storage).await;

        assert_eq!(storage.count_users_by_role(UserRole::Admin).await.unwrap(), 1);
        let admin = storage.get_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
    }
}
