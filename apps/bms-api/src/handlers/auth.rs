//! 认证相关 handlers：健康检查、登录、刷新 token。
//!
//! ### 公开端点（无需认证）
//! - `GET /health` - 健康检查，返回 `{"ok": true}`
//! - `POST /login` - 邮箱密码登录，返回 access/refresh token
//! - `POST /refresh-token` - 使用 refresh token 换取新 token 对

use crate::AppState;
use crate::utils::response::{auth_error, internal_auth_error};
use api_contract::{
    ApiResponse, LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bms_auth::AuthError;

/// 健康检查端点。只反映进程存活，不做外部依赖检查。
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// 登录：验证邮箱密码，签发 token 对
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    match state.auth.login(&req.email, &req.password).await {
        Ok((user, tokens)) => {
            let response = LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires: tokens.expires_at.saturating_mul(1000),
                user_id: user.user_id,
                email: user.email,
                display_name: user.display_name,
                is_system_administrator: user.is_system_administrator,
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(AuthError::InvalidCredentials) => auth_error(StatusCode::UNAUTHORIZED),
        Err(err) => internal_auth_error(err),
    }
}

/// 刷新 token：验证 refresh token 并轮换 jti
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Response {
    match state.auth.refresh(&req.refresh_token).await {
        Ok(tokens) => {
            let response = RefreshTokenResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                expires: tokens.expires_at.saturating_mul(1000),
            };
            (StatusCode::OK, Json(ApiResponse::success(response))).into_response()
        }
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => {
            auth_error(StatusCode::UNAUTHORIZED)
        }
        Err(err) => internal_auth_error(err),
    }
}
