//! 前端静态资源
//!
//! 构建产物由 rust-embed 编译进二进制；`frontend-custom/` 下的同名文件优先，
//! 便于部署时替换 logo 等资源而无需重新编译。

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::StatusCode, web};
use rust_embed::Embed;
use std::borrow::Cow;
use std::path::Path;

use crate::models::{ApiResponse, ErrorCode};
use crate::services::DynamicConfig;

#[derive(Embed)]
#[folder = "frontend/dist/"]
struct FrontendAssets;

const CUSTOM_DIR: &str = "./frontend-custom";

fn extension(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
}

fn mime_for(path: &str) -> &'static str {
    match extension(path) {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json; charset=utf-8",
        "webmanifest" => "application/manifest+json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// 带 hash 的打包产物可长期缓存，HTML 等入口文件不缓存
fn is_immutable_asset(path: &str) -> bool {
    path.starts_with("assets/")
        && matches!(
            extension(path),
            "js" | "css" | "woff" | "woff2" | "ttf" | "png" | "jpg" | "jpeg" | "svg" | "webp"
        )
}

/// 拒绝包含 `..` 等越界片段的路径
fn is_safe_path(path: &str) -> bool {
    !path
        .split('/')
        .any(|seg| seg == ".." || seg == "." || seg.contains('\\'))
}

fn load_asset(path: &str) -> Option<Cow<'static, [u8]>> {
    if !is_safe_path(path) {
        return None;
    }
    if let Ok(data) = std::fs::read(Path::new(CUSTOM_DIR).join(path)) {
        return Some(Cow::Owned(data));
    }
    FrontendAssets::get(path).map(|f| f.data)
}

/// 替换页面中的站点名称占位符
fn render_html(content: &[u8], site_name: &str) -> Vec<u8> {
    String::from_utf8_lossy(content)
        .replace("%SITE_NAME%", site_name)
        .into_bytes()
}

fn placeholder_page(site_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head><meta charset="utf-8"><title>{site_name}</title></head>
<body>
    <h1>{site_name}</h1>
    <p>Frontend belum dibangun. Jalankan build frontend lalu kompilasi ulang server.</p>
</body>
</html>"#
    )
}

pub async fn serve_frontend(req: HttpRequest) -> ActixResult<HttpResponse> {
    let path = req.match_info().query("tail").trim_start_matches('/');

    // 未匹配的 API 路径不回落到 SPA
    if path == "api" || path.starts_with("api/") {
        return Ok(ApiResponse::respond(
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
            format!("No route for /{path}"),
        ));
    }

    let (file_path, content) = match (!path.is_empty()).then(|| load_asset(path)).flatten() {
        Some(content) => (path, Some(content)),
        None => ("index.html", load_asset("index.html")),
    };

    let site_name = DynamicConfig::site_name().await;
    let Some(data) = content else {
        return Ok(HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(placeholder_page(&site_name)));
    };

    let mime = mime_for(file_path);
    let cache = if is_immutable_asset(file_path) {
        "public, max-age=31536000, immutable"
    } else {
        "no-cache"
    };

    let body = if mime.starts_with("text/html") {
        render_html(&data, &site_name)
    } else {
        data.into_owned()
    };

    Ok(HttpResponse::Ok()
        .content_type(mime)
        .insert_header(("Cache-Control", cache))
        .body(body))
}

/// 须最后注册，兜底所有 GET 请求
pub fn configure_frontend_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/{tail:.*}", web::get().to(serve_frontend));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(mime_for("assets/app.mjs"), "application/javascript; charset=utf-8");
        assert_eq!(mime_for("manifest.webmanifest"), "application/manifest+json");
        assert_eq!(mime_for("blob"), "application/octet-stream");
    }

    #[test]
    fn test_cache_policy() {
        assert!(is_immutable_asset("assets/index-4f2a.js"));
        assert!(!is_immutable_asset("logo.png"));
        assert!(!is_immutable_asset("index.html"));
    }

    #[test]
    fn test_path_guard() {
        assert!(is_safe_path("assets/app.js"));
        assert!(!is_safe_path("../Cargo.toml"));
        assert!(!is_safe_path("assets/../../etc/passwd"));
        assert!(load_asset("../Cargo.toml").is_none());
    }

    #[test]
    fn test_render_html() {
        let html = render_html(b"<title>%SITE_NAME%</title>", "Kelas Coding");
        assert_eq!(html, b"<title>Kelas Coding</title>");
    }

    #[actix_web::test]
    async fn test_unknown_api_path_is_json_404() {
        crate::config::AppConfig::init().ok();
        let app = init_service(App::new().configure(configure_frontend_routes)).await;
        let req = TestRequest::get().uri("/api/v1/nope").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::NotFound as i32);
    }
}
