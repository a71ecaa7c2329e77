use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 资料类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub enum MaterialKind {
    Pdf,
    Video,
    Link,
    Text,
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MaterialKind::Pdf => "pdf",
            MaterialKind::Video => "video",
            MaterialKind::Link => "link",
            MaterialKind::Text => "text",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for MaterialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(MaterialKind::Pdf),
            "video" => Ok(MaterialKind::Video),
            "link" => Ok(MaterialKind::Link),
            "text" => Ok(MaterialKind::Text),
            _ => Err(format!("Invalid material kind: {s}")),
        }
    }
}

/// 学习资料（materi）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/material.ts")]
pub struct Material {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub kind: MaterialKind,
    pub url: Option<String>,
    pub text_content: Option<String>,
    pub cover_url: Option<String>,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 文本资料必须有正文，其余类型必须有链接
pub fn validate_material_content(
    kind: MaterialKind,
    url: Option<&str>,
    text_content: Option<&str>,
) -> Result<(), &'static str> {
    let present = |v: Option<&str>| v.is_some_and(|s| !s.trim().is_empty());
    match kind {
        MaterialKind::Text if !present(text_content) => {
            Err("Text material requires text_content")
        }
        MaterialKind::Pdf | MaterialKind::Video | MaterialKind::Link if !present(url) => {
            Err("This material kind requires a url")
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_requires_content() {
        assert!(validate_material_content(MaterialKind::Text, None, None).is_err());
        assert!(validate_material_content(MaterialKind::Text, None, Some("  ")).is_err());
        assert!(validate_material_content(MaterialKind::Text, None, Some("Bab 1")).is_ok());
    }

    #[test]
    fn test_other_kinds_require_url() {
        assert!(validate_material_content(MaterialKind::Pdf, None, Some("x")).is_err());
        assert!(
            validate_material_content(MaterialKind::Video, Some("https://v.example/1"), None)
                .is_ok()
        );
    }
}
