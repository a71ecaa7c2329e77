//! 路径参数提取器
//!
//! 解析失败时直接返回统一格式的 400 响应，而不是 actix 默认的纯文本错误。

use actix_web::{FromRequest, HttpRequest, dev::Payload, error::InternalError, http::StatusCode};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path_param(name: &str, raw: &str) -> actix_web::Error {
    let message = format!("Invalid path parameter '{name}': '{raw}'");
    let response = ApiResponse::respond(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &message);
    InternalError::from_response(message, response).into()
}

/// 定义正整数 ID 路径参数提取器
macro_rules! define_id_extractor {
    ($(#[$meta:meta])* $name:ident, $param:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                let raw = req.match_info().get($param).unwrap_or_default();
                ready(match raw.parse::<i64>() {
                    Ok(id) if id > 0 => Ok($name(id)),
                    _ => Err(bad_path_param($param, raw)),
                })
            }
        }
    };
}

/// 定义字符串路径参数提取器，仅允许给定字符集
macro_rules! define_token_extractor {
    ($(#[$meta:meta])* $name:ident, $param:literal, $allowed:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub String);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                let raw = req.match_info().get($param).unwrap_or_default();
                let allowed: fn(char) -> bool = $allowed;
                ready(if !raw.is_empty() && raw.len() <= 128 && raw.chars().all(allowed) {
                    Ok($name(raw.to_string()))
                } else {
                    Err(bad_path_param($param, raw))
                })
            }
        }
    };
}

define_id_extractor!(
    /// `{id}`
    SafeIDI64,
    "id"
);
define_id_extractor!(
    /// `{class_id}`
    SafeClassIdI64,
    "class_id"
);
define_id_extractor!(
    /// `{student_id}`
    SafeStudentIdI64,
    "student_id"
);
define_id_extractor!(
    /// `{question_id}`
    SafeQuestionIdI64,
    "question_id"
);
define_id_extractor!(
    /// `{submission_id}`
    SafeSubmissionIdI64,
    "submission_id"
);

define_token_extractor!(
    /// 文件下载 token
    SafeFileToken,
    "token",
    |c| c.is_ascii_alphanumeric() || c == '-'
);
define_token_extractor!(
    /// 设置键，如 `site.name`
    SafeSettingKey,
    "key",
    |c| c.is_ascii_alphanumeric() || c == '.' || c == '_'
);

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_id_extractor() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        let id = SafeIDI64::extract(&req).await.unwrap();
        assert_eq!(id.0, 42);

        let req = TestRequest::default().param("id", "0").to_http_request();
        assert!(SafeIDI64::extract(&req).await.is_err());

        let req = TestRequest::default().param("class_id", "abc").to_http_request();
        assert!(SafeClassIdI64::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn test_setting_key_extractor() {
        let req = TestRequest::default().param("key", "site.name").to_http_request();
        assert_eq!(SafeSettingKey::extract(&req).await.unwrap().0, "site.name");

        let req = TestRequest::default().param("key", "../etc").to_http_request();
        assert!(SafeSettingKey::extract(&req).await.is_err());
    }
}
