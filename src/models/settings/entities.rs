use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 公开可读的设置键前缀
pub const PUBLIC_SETTING_PREFIXES: &[&str] = &["site.", "contact."];

/// 设置值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/settings.ts")]
pub enum SettingValueType {
    String,
    Integer,
    Boolean,
    JsonArray,
}

impl SettingValueType {
    /// 校验值是否符合类型
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            SettingValueType::String => Ok(()),
            SettingValueType::Integer => value
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("'{value}' is not an integer")),
            SettingValueType::Boolean => value
                .parse::<bool>()
                .map(|_| ())
                .map_err(|_| format!("'{value}' is not a boolean")),
            SettingValueType::JsonArray => serde_json::from_str::<Vec<serde_json::Value>>(value)
                .map(|_| ())
                .map_err(|_| format!("'{value}' is not a JSON array")),
        }
    }
}

impl std::fmt::Display for SettingValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SettingValueType::String => "string",
            SettingValueType::Integer => "integer",
            SettingValueType::Boolean => "boolean",
            SettingValueType::JsonArray => "json_array",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SettingValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(SettingValueType::String),
            "integer" => Ok(SettingValueType::Integer),
            "boolean" => Ok(SettingValueType::Boolean),
            "json_array" => Ok(SettingValueType::JsonArray),
            _ => Err(format!("Invalid setting value type: {s}")),
        }
    }
}

/// 站点设置项
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/settings.ts")]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<i64>,
}

impl Setting {
    pub fn is_public(&self) -> bool {
        is_public_key(&self.key)
    }
}

pub fn is_public_key(key: &str) -> bool {
    PUBLIC_SETTING_PREFIXES.iter().any(|p| key.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_keys() {
        assert!(is_public_key("site.name"));
        assert!(is_public_key("contact.email"));
        assert!(!is_public_key("upload.max_size"));
    }

    #[test]
    fn test_value_type_validation() {
        assert!(SettingValueType::Integer.validate("1024").is_ok());
        assert!(SettingValueType::Integer.validate("1kb").is_err());
        assert!(SettingValueType::JsonArray.validate(r#"[".pdf"]"#).is_ok());
        assert!(SettingValueType::JsonArray.validate(".pdf").is_err());
        assert!(SettingValueType::Boolean.validate("true").is_ok());
    }
}
