use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::UploadBackend;

/// 上传文件记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/file.ts")]
pub struct File {
    pub download_token: String,
    pub original_name: String,
    /// 本地为存储文件名，远程为返回的 path
    pub stored_path: String,
    pub remote_file_id: Option<String>,
    #[ts(type = "\"local\" | \"remote\"")]
    pub backend: UploadBackend,
    pub file_size: i64,
    pub file_type: String,
    pub user_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 新文件记录
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub stored_path: String,
    pub remote_file_id: Option<String>,
    pub backend: UploadBackend,
    pub file_size: i64,
    pub file_type: String,
    pub user_id: i64,
}
