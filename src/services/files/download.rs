use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use std::path::Path;

use super::FileService;
use crate::config::{AppConfig, UploadBackend};
use crate::models::ErrorCode;
use crate::services::{not_found, storage_failure};

/// Content-Disposition 中的文件名去掉引号与控制字符
fn header_safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect()
}

pub async fn handle_download(
    service: &FileService,
    request: &HttpRequest,
    file_token: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let file = storage
        .get_file_by_token(&file_token)
        .await
        .map_err(storage_failure("File query failed"))?
        .ok_or_else(|| not_found(ErrorCode::FileNotFound, "File not found"))?;

    // 远程文件直接跳转到远程地址
    if file.backend == UploadBackend::Remote {
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, file.stored_path))
            .finish());
    }

    let file_path = Path::new(&AppConfig::get().upload.dir).join(&file.stored_path);
    let bytes = match std::fs::read(&file_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(not_found(ErrorCode::FileNotFound, "File not found"));
        }
        Err(e) => {
            tracing::error!("Failed to read {}: {}", file_path.display(), e);
            return Err(not_found(ErrorCode::FileNotFound, "File is not readable"));
        }
    };

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "application/octet-stream"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                header_safe_name(&file.original_name)
            ),
        ))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_name() {
        assert_eq!(header_safe_name("tugas \"1\".pdf"), "tugas 1.pdf");
        assert_eq!(header_safe_name("a\r\nb.png"), "ab.png");
    }
}
