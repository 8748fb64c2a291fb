//! 运行时长巡检与指标 handlers
//!
//! - POST /runtime/sweep - 手动触发一轮巡检（仅系统管理员）
//! - GET /metrics - 进程内计数器快照

use crate::AppState;
use crate::middleware::{require_admin, require_user_context};
use crate::utils::response::{internal_error, storage_error};
use api_contract::{ApiResponse, MetricsDto, SweepReportDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

/// 手动触发一轮运行时长巡检
pub async fn trigger_sweep(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let device_ids = match state.device_store.list_devices().await {
        Ok(devices) => devices
            .into_iter()
            .map(|device| device.device_id)
            .collect::<Vec<_>>(),
        Err(err) => return storage_error(err),
    };
    match state.runtime.sweep(&device_ids).await {
        Ok(report) => {
            let dto = SweepReportDto {
                checked: report.checked,
                warnings_sent: report.warnings_sent,
            };
            (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
        }
        Err(err) => internal_error(err.to_string()),
    }
}

/// 指标快照
pub async fn metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_user_context(&state, &headers) {
        return response;
    }
    let snapshot = bms_telemetry::metrics().snapshot();
    let dto = MetricsDto {
        commands_received: snapshot.commands_received,
        commands_accepted: snapshot.commands_accepted,
        commands_rejected: snapshot.commands_rejected,
        runtime_warnings_sent: snapshot.runtime_warnings_sent,
        runtime_sweeps: snapshot.runtime_sweeps,
        event_append_failures: snapshot.event_append_failures,
        automation_mode_changes: snapshot.automation_mode_changes,
        bulk_shed_actions: snapshot.bulk_shed_actions,
        energy_accruals: snapshot.energy_accruals,
    };
    (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
}
