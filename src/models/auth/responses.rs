use crate::models::users::entities::User;
use serde::Serialize;
use ts_rs::TS;

/// 登录成功：refresh token 通过 http-only cookie 下发，不出现在响应体中
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// access token 有效秒数
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub const TOKEN_TYPE: &str = "Bearer";
