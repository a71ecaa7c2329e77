//! Argon2id 密码哈希
//!
//! 参数取自配置；校验时使用哈希串中自带的参数，调整配置不影响已有账号登录。

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::config::{AppConfig, Argon2Config};
use crate::errors::LmsError;

fn hasher(config: &Argon2Config) -> Result<Argon2<'static>, LmsError> {
    let params = Params::new(
        config.memory_cost,
        config.time_cost,
        config.parallelism,
        None,
    )
    .map_err(|e| LmsError::validation(format!("Invalid argon2 parameters: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_with(config: &Argon2Config, password: &str) -> Result<String, LmsError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher(config)?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LmsError::validation(format!("Password hashing failed: {e}")))
}

pub fn hash_password(password: &str) -> Result<String, LmsError> {
    hash_with(&AppConfig::get().argon2, password)
}

/// 哈希串无法解析时视为不匹配
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Config {
        Argon2Config {
            memory_cost: 8,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_with(&cheap(), "rahasia123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("rahasia124", &hash));
    }

    #[test]
    fn test_salted() {
        let a = hash_with(&cheap(), "sama").unwrap();
        let b = hash_with(&cheap(), "sama").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_rejected() {
        assert!(!verify_password("anything", "hash"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_invalid_params() {
        let config = Argon2Config {
            memory_cost: 8,
            time_cost: 0,
            parallelism: 1,
        };
        assert!(hash_with(&config, "x").is_err());
    }
}
