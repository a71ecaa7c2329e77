use serde::Serialize;
use ts_rs::TS;

/// 上传结果：`path` 为可直接引用的地址
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/file.ts")]
pub struct FileUploadResponse {
    pub status: bool,
    pub path: String,
    pub file_id: Option<String>,
    pub download_token: String,
    pub file_name: String,
    pub size: i64,
    pub content_type: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}
