//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token：从 Authorization 头提取 Bearer token
//! - require_user_context：验证 token 并提取请求者上下文
//! - require_admin：在用户上下文基础上要求系统管理员
//! - require_manage：要求管理能力（系统管理员或任一楼宇 parent）

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use bms_auth::AuthError;
use bms_telemetry::new_request_ids;
use domain::UserContext;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::{access_error, auth_error, forbidden_error, internal_auth_error};

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response: axum::response::Response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 验证并提取请求者上下文
pub fn require_user_context(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<UserContext, Response> {
    let token = match bearer_token(headers) {
        Some(token) => token,
        None => return Err(auth_error(axum::http::StatusCode::UNAUTHORIZED)),
    };
    match state.auth.verify_access_token(token) {
        Ok(ctx) => Ok(ctx),
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => {
            Err(auth_error(axum::http::StatusCode::UNAUTHORIZED))
        }
        Err(err) => Err(internal_auth_error(err)),
    }
}

/// 要求系统管理员
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<UserContext, Response> {
    let ctx = require_user_context(state, headers)?;
    if !ctx.is_system_administrator {
        return Err(forbidden_error());
    }
    Ok(ctx)
}

/// 要求管理能力（系统管理员或任一楼宇 parent）
pub async fn require_manage(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<UserContext, Response> {
    let ctx = require_user_context(state, headers)?;
    match state.resolver.can_manage(&ctx).await {
        Ok(true) => Ok(ctx),
        Ok(false) => Err(forbidden_error()),
        Err(err) => Err(access_error(err)),
    }
}
