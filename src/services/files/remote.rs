//! 远程上传接口
//!
//! 以 multipart 字段 `file` 转发，响应形如 `{"status": true, "path": "...", "fileId": "..."}`。

use std::time::Duration;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::config::AppConfig;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(AppConfig::get().upload.remote_timeout.max(1)))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

#[derive(Debug, Deserialize)]
struct RemoteReply {
    status: bool,
    #[serde(default)]
    path: Option<String>,
    #[serde(default, rename = "fileId")]
    file_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct RemoteUpload {
    pub path: String,
    pub file_id: Option<String>,
}

/// 解析远程接口响应，`status` 为 false 或缺少 path 视为失败
pub fn parse_reply(body: &str) -> Result<RemoteUpload, String> {
    let reply: RemoteReply =
        serde_json::from_str(body).map_err(|e| format!("Unreadable upload response: {e}"))?;
    if !reply.status {
        return Err(reply
            .message
            .unwrap_or_else(|| "Remote store rejected the file".to_string()));
    }
    match reply.path.filter(|p| !p.is_empty()) {
        Some(path) => Ok(RemoteUpload {
            path,
            file_id: reply.file_id.filter(|id| !id.is_empty()),
        }),
        None => Err("Upload response has no path".to_string()),
    }
}

pub async fn forward(
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<RemoteUpload, String> {
    let url = &AppConfig::get().upload.remote_url;

    let mut part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
    if !content_type.is_empty() {
        part = part
            .mime_str(content_type)
            .map_err(|e| format!("Invalid content type: {e}"))?;
    }
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = HTTP_CLIENT
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| format!("Upload request failed: {e}"))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Upload response unreadable: {e}"))?;

    if !status.is_success() {
        tracing::warn!("Remote upload returned {}: {}", status, body);
        return Err(format!("Remote store answered {status}"));
    }
    parse_reply(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let reply = parse_reply(r#"{"status":true,"path":"https://cdn.kelas.id/a.pdf","fileId":"f-12"}"#)
            .unwrap();
        assert_eq!(reply.path, "https://cdn.kelas.id/a.pdf");
        assert_eq!(reply.file_id.as_deref(), Some("f-12"));

        let reply = parse_reply(r#"{"status":true,"path":"/files/b.png"}"#).unwrap();
        assert_eq!(reply.file_id, None);
    }

    #[test]
    fn test_parse_failure() {
        assert_eq!(
            parse_reply(r#"{"status":false,"message":"quota exceeded"}"#).unwrap_err(),
            "quota exceeded"
        );
        assert!(parse_reply(r#"{"status":false}"#).is_err());
        assert!(parse_reply(r#"{"status":true}"#).is_err());
        assert!(parse_reply("<html>502</html>").is_err());
    }
}
