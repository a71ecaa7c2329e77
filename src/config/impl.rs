use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::{AppConfig, UploadBackend};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// 常用环境变量到配置键的映射，未设置时不覆盖
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("APP_ENV", "app.environment"),
    ("RUST_LOG", "app.log_level"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("UNIX_SOCKET", "server.unix_socket_path"),
    ("CPU_COUNT", "server.workers"),
    ("JWT_SECRET", "jwt.secret"),
    ("DATABASE_URL", "database.url"),
    ("REDIS_URL", "cache.redis.url"),
    ("UPLOAD_BACKEND", "upload.backend"),
    ("UPLOAD_DIR", "upload.dir"),
    ("UPLOAD_REMOTE_URL", "upload.remote_url"),
];

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{env_name}")).required(false))
            // KELAS_SERVER_PORT=9000 形式的覆盖
            .add_source(
                Environment::with_prefix("KELAS")
                    .separator("_")
                    .try_parsing(true),
            );
        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers).max(1);
        }
        app_config.validate()?;
        Ok(app_config)
    }

    /// 拒绝无法正常运行的组合
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Message(msg.to_string()));

        if self.jwt.secret.is_empty() {
            return fail("jwt.secret must not be empty");
        }
        if !self.is_development() && self.jwt.secret == DEFAULT_JWT_SECRET {
            return fail("jwt.secret must be changed outside development");
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return fail("jwt token expiry must be positive");
        }
        if self.upload.max_size == 0 {
            return fail("upload.max_size must be positive");
        }
        if self.upload.backend == UploadBackend::Remote && self.upload.remote_url.is_empty() {
            return fail("upload.remote_url is required for the remote backend");
        }
        if self.exam.utc_offset_minutes.abs() > 14 * 60 {
            return fail("exam.utc_offset_minutes must be within +/-14 hours");
        }
        Ok(())
    }

    /// 未调用 `init` 时按需加载，失败直接退出进程
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig::load().expect("config.toml should load")
    }

    #[test]
    fn test_default_file_is_valid() {
        let config = base();
        assert!(config.server.workers >= 1);
        assert_eq!(config.exam.offset().local_minus_utc(), 420 * 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_default_secret_in_production() {
        let mut config = base();
        config.app.environment = "production".into();
        config.jwt.secret = DEFAULT_JWT_SECRET.into();
        assert!(config.validate().is_err());

        config.jwt.secret = "a-real-secret".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_backend_needs_url() {
        let mut config = base();
        config.upload.backend = UploadBackend::Remote;
        config.upload.remote_url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offset_bounds() {
        let mut config = base();
        config.exam.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());
    }
}
