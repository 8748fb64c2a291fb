//! 楼宇自动化 handlers
//!
//! - GET /buildings/{id}/automation - 查询自动化状态（需在该楼宇持有角色）
//! - PUT /buildings/{id}/automation - 设置模式（管理员或该楼宇 parent）
//! - DELETE /buildings/{id}/automation - 清除模式（同上）
//! - GET /buildings/{id}/automation/statistics - 统计报表
//! - POST /buildings/{id}/automation/rules/plan - 按历史事件推导规则（同上）

use crate::AppState;
use crate::handlers::locations::BuildingPath;
use crate::middleware::require_user_context;
use crate::utils::response::{
    access_error, automation_state_to_dto, bad_request_error, forbidden_error, internal_error,
    not_found_error, statistics_to_dto,
};
use api_contract::{ApiResponse, SetAutomationRequest};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bms_automation::AutomationError;
use domain::{AutomationMode, BuildingRole, UserContext};

/// 校验请求者可以操作该楼宇的自动化（管理员或 parent）
async fn require_building_operator(
    state: &AppState,
    headers: &HeaderMap,
    building_id: &str,
) -> Result<UserContext, Response> {
    let ctx = require_user_context(state, headers)?;
    if ctx.is_system_administrator {
        return Ok(ctx);
    }
    match state.resolver.role_in_building(&ctx.user_id, building_id).await {
        Ok(record) if record.role == BuildingRole::Parent => Ok(ctx),
        Ok(_) => Err(forbidden_error()),
        Err(err) => Err(access_error(err)),
    }
}

fn automation_error(err: AutomationError) -> Response {
    match err {
        AutomationError::BuildingNotFound(_) => not_found_error(),
        AutomationError::Storage(message) => internal_error(message),
    }
}

/// 查询自动化状态
pub async fn get_automation(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if !ctx.is_system_administrator {
        let role = match state
            .resolver
            .role_in_building(&ctx.user_id, &path.building_id)
            .await
        {
            Ok(record) => record.role,
            Err(err) => return access_error(err),
        };
        if role == BuildingRole::None {
            return forbidden_error();
        }
    }

    match state.automation.get_mode(&path.building_id).await {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(automation_state_to_dto(record))),
        )
            .into_response(),
        Err(err) => automation_error(err),
    }
}

/// 设置自动化模式
pub async fn set_automation(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
    Json(req): Json<SetAutomationRequest>,
) -> Response {
    let ctx = match require_building_operator(&state, &headers, &path.building_id).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Some(mode) = AutomationMode::parse(&req.mode) else {
        return bad_request_error(format!("unknown mode: {}", req.mode));
    };

    match state
        .automation
        .set_mode(&path.building_id, mode, &ctx.user_id)
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(automation_state_to_dto(record))),
        )
            .into_response(),
        Err(err) => automation_error(err),
    }
}

/// 清除自动化模式
pub async fn clear_automation(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_building_operator(&state, &headers, &path.building_id).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state
        .automation
        .clear_mode(&path.building_id, &ctx.user_id)
        .await
    {
        Ok(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(automation_state_to_dto(record))),
        )
            .into_response(),
        Err(err) => automation_error(err),
    }
}

/// 自动化统计报表
pub async fn automation_statistics(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if !ctx.is_system_administrator {
        let role = match state
            .resolver
            .role_in_building(&ctx.user_id, &path.building_id)
            .await
        {
            Ok(record) => record.role,
            Err(err) => return access_error(err),
        };
        if role == BuildingRole::None {
            return forbidden_error();
        }
    }

    match state.automation.statistics(&path.building_id).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(ApiResponse::success(statistics_to_dto(stats))),
        )
            .into_response(),
        Err(err) => automation_error(err),
    }
}

/// 按历史事件为楼宇设备推导自动化规则
pub async fn plan_automation_rules(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_building_operator(&state, &headers, &path.building_id).await {
        return response;
    }
    let devices = match state.device_store.list_devices().await {
        Ok(items) => items,
        Err(err) => return crate::utils::response::storage_error(err),
    };
    // 只为解析到该楼宇的已认领设备推导
    let mut device_ids = Vec::new();
    for device in devices {
        let Some(location_id) = device.location_id.as_deref() else {
            continue;
        };
        match state.location_store.find_location(location_id).await {
            Ok(Some(location)) if location.building_id == path.building_id => {
                device_ids.push(device.device_id);
            }
            Ok(_) => {}
            Err(err) => return crate::utils::response::storage_error(err),
        }
    }

    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or_default();
    match state.planner.plan_rules(&device_ids, now_ms).await {
        Ok(planned) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "planned": planned }))),
        )
            .into_response(),
        Err(err) => automation_error(err),
    }
}
