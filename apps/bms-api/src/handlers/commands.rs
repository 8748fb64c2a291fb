//! 设备命令 handler
//!
//! - POST /devices/{id}/commands - 通过授权门下发 turn-on / turn-off / toggle
//!
//! 拒绝码与 HTTP 状态码的映射：
//! - NOT_AUTHORIZED → 403
//! - DEVICE_LOCKED → 409
//! - DEVICE_NOT_FOUND → 404
//! - VALIDATION_ERROR → 400

use crate::AppState;
use crate::handlers::devices::DevicePath;
use crate::middleware::require_user_context;
use crate::utils::response::command_rejection;
use api_contract::{ApiResponse, CommandRequest, CommandResultDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bms_control::{CommandDecision, RejectionCode};
use domain::CommandAction;

/// 下发设备命令
pub async fn issue_command(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    headers: HeaderMap,
    Json(req): Json<CommandRequest>,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    // 动作字符串不合法：终态校验失败，不进入授权门
    let Some(action) = CommandAction::parse(&req.action) else {
        return command_rejection(
            RejectionCode::ValidationError,
            format!("unknown action: {}", req.action),
        );
    };

    match state.gate.issue_command(&ctx, &path.device_id, action).await {
        CommandDecision::Accepted { new_status } => {
            let dto = CommandResultDto {
                device_id: path.device_id,
                new_status: new_status.as_str().to_string(),
            };
            (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
        }
        CommandDecision::Rejected { code, reason } => command_rejection(code, reason),
    }
}
