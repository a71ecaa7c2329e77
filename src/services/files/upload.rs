use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::{FileService, remote};
use crate::config::{AppConfig, UploadBackend};
use crate::models::files::{entities::NewFile, responses::FileUploadResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{bad_request, current_user, reject, settings::DynamicConfig, storage_failure};
use crate::utils::validate_magic_bytes;

/// 已读入内存并通过校验的上传文件
struct ReceivedFile {
    original_name: String,
    extension: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// 小写并带点的扩展名，如 `.pdf`
pub(crate) fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub(crate) fn is_allowed(extension: &str, allowed_types: &[String]) -> bool {
    !extension.is_empty() && allowed_types.iter().any(|t| t.to_lowercase() == extension)
}

fn upload_failed(msg: impl Into<String>) -> actix_web::Error {
    reject(StatusCode::BAD_GATEWAY, ErrorCode::FileUploadFailed, msg)
}

async fn receive_file(mut payload: Multipart) -> ActixResult<ReceivedFile> {
    let max_size = DynamicConfig::upload_max_size().await;
    let allowed_types = DynamicConfig::upload_allowed_types().await;
    let mut received: Option<ReceivedFile> = None;

    while let Some(mut field) = payload.try_next().await? {
        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        if name != "file" {
            continue;
        }
        if received.is_some() {
            return Err(bad_request(
                ErrorCode::MultifileUploadNotAllowed,
                "Only one file can be uploaded at a time",
            ));
        }

        let original_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string())
            .unwrap_or_default();
        let extension = file_extension(&original_name);
        if !is_allowed(&extension, &allowed_types) {
            return Err(bad_request(
                ErrorCode::FileTypeNotAllowed,
                "File type not allowed",
            ));
        }
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            // 首个分块校验魔术字节
            if bytes.is_empty() && !validate_magic_bytes(&data, &extension) {
                return Err(bad_request(
                    ErrorCode::FileTypeNotAllowed,
                    "File content does not match its extension",
                ));
            }
            if bytes.len() + data.len() > max_size {
                return Err(bad_request(
                    ErrorCode::FileSizeExceeded,
                    "File size exceeds the limit",
                ));
            }
            bytes.extend_from_slice(&data);
        }
        if bytes.is_empty() {
            return Err(bad_request(ErrorCode::FileNotFound, "Uploaded file is empty"));
        }

        received = Some(ReceivedFile {
            original_name,
            extension,
            content_type,
            bytes,
        });
    }

    received.ok_or_else(|| bad_request(ErrorCode::FileNotFound, "No file found in upload payload"))
}

fn store_locally(file: &ReceivedFile) -> ActixResult<String> {
    let upload_dir = &AppConfig::get().upload.dir;
    let failed = |e: std::io::Error| {
        tracing::error!("Local upload failed: {}", e);
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::FileUploadFailed,
            "Failed to store file",
        )
    };

    fs::create_dir_all(upload_dir).map_err(failed)?;
    let stored_name = format!(
        "{}-{}{}",
        chrono::Utc::now().timestamp(),
        Uuid::new_v4(),
        file.extension
    );
    fs::write(Path::new(upload_dir).join(&stored_name), &file.bytes).map_err(failed)?;
    Ok(stored_name)
}

pub async fn handle_upload(
    service: &FileService,
    req: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(req)?;
    let user = current_user(req)?;
    let mut file = receive_file(payload).await?;
    let backend = AppConfig::get().upload.backend;
    let file_size = file.bytes.len() as i64;

    let (stored_path, remote_file_id) = match backend {
        UploadBackend::Local => (store_locally(&file)?, None),
        UploadBackend::Remote => {
            let bytes = std::mem::take(&mut file.bytes);
            let uploaded = remote::forward(&file.original_name, &file.content_type, bytes)
                .await
                .map_err(|msg| {
                    tracing::warn!("Remote upload of {} failed: {}", file.original_name, msg);
                    upload_failed(msg)
                })?;
            (uploaded.path, uploaded.file_id)
        }
    };

    let record = storage
        .create_file(NewFile {
            original_name: file.original_name,
            stored_path,
            remote_file_id,
            backend,
            file_size,
            file_type: file.content_type,
            user_id: user.id,
        })
        .await
        .map_err(storage_failure("Failed to save file record"))?;

    let path = match record.backend {
        UploadBackend::Local => format!("/api/v1/files/{}", record.download_token),
        UploadBackend::Remote => record.stored_path.clone(),
    };
    tracing::info!(
        "File {} ({} bytes) uploaded by {} via {}",
        record.original_name,
        record.file_size,
        user.id,
        record.backend
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        FileUploadResponse {
            status: true,
            path,
            file_id: record.remote_file_id,
            download_token: record.download_token,
            file_name: record.original_name,
            size: record.file_size,
            content_type: record.file_type,
            uploaded_at: record.created_at,
        },
        "File uploaded successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Modul 1.PDF"), ".pdf");
        assert_eq!(file_extension("foto.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
    }

    #[test]
    fn test_allow_list() {
        let allowed = vec![".pdf".to_string(), ".PNG".to_string()];
        assert!(is_allowed(".pdf", &allowed));
        assert!(is_allowed(".png", &allowed));
        assert!(!is_allowed(".exe", &allowed));
        assert!(!is_allowed("", &allowed));
    }
}
