//! 设备 handlers
//!
//! - GET /devices - 列出请求者可见的设备（合并实时状态）
//! - POST /devices - 创建设备（管理能力）
//! - GET /devices/{id} - 设备详情（可见性检查）
//! - DELETE /devices/{id} - 删除设备（管理能力；事件历史保留）
//! - POST /devices/{id}/claim - 认领设备到位置（管理能力）
//! - POST /devices/{id}/unclaim - 取消认领（管理能力）

use crate::AppState;
use crate::middleware::{require_manage, require_user_context};
use crate::utils::response::{
    access_error, bad_request_error, device_to_dto, forbidden_error, not_found_error,
    storage_error,
};
use crate::utils::{normalize_optional, normalize_required};
use api_contract::{ApiResponse, ClaimDeviceRequest, CreateDeviceRequest, DeviceDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bms_storage::DeviceRecord;
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct DevicePath {
    pub device_id: String,
}

/// 列出请求者可见的设备
pub async fn list_devices(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let devices = match state.device_store.list_devices().await {
        Ok(items) => items,
        Err(err) => return storage_error(err),
    };
    let visible = state.resolver.resolve_visible_devices(&ctx, devices).await;

    let mut data: Vec<DeviceDto> = Vec::with_capacity(visible.len());
    for device in visible {
        let status = state
            .status_store
            .get_status(&device.device_id)
            .await
            .unwrap_or(None);
        data.push(device_to_dto(device, status));
    }
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 创建设备（初始未认领，除非携带位置）
pub async fn create_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateDeviceRequest>,
) -> Response {
    let ctx = match require_manage(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let name = match normalize_required(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let device_type = match normalize_required(req.device_type, "deviceType") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let location_id = match normalize_optional(req.location_id, "locationId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    if let Some(location_id) = location_id.as_deref() {
        match state.location_store.find_location(location_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return bad_request_error("location not found"),
            Err(err) => return storage_error(err),
        }
    }

    let record = DeviceRecord {
        device_id: Uuid::new_v4().to_string(),
        name,
        device_type,
        wattage_w: req.wattage_w.unwrap_or(0).max(0),
        location_id,
        assigned_to: Vec::new(),
    };
    match state.device_store.create_device(record).await {
        Ok(item) => {
            tracing::info!(
                target: "bms_api",
                device_id = %item.device_id,
                actor = %ctx.user_id,
                "device created"
            );
            (
                StatusCode::OK,
                Json(ApiResponse::success(device_to_dto(item, None))),
            )
                .into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 设备详情
pub async fn get_device(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let device = match state.device_store.find_device(&path.device_id).await {
        Ok(Some(item)) => item,
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    };
    match state.resolver.can_view(&ctx, &device).await {
        Ok(true) => {}
        Ok(false) => return forbidden_error(),
        Err(err) => return access_error(err),
    }

    let status = state
        .status_store
        .get_status(&device.device_id)
        .await
        .unwrap_or(None);
    (
        StatusCode::OK,
        Json(ApiResponse::success(device_to_dto(device, status))),
    )
        .into_response()
}

/// 删除设备。实时状态与规则一并清除，事件历史保留。
pub async fn delete_device(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_manage(&state, &headers).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.device_store.delete_device(&path.device_id).await {
        Ok(true) => {}
        Ok(false) => return not_found_error(),
        Err(err) => return storage_error(err),
    }
    if let Err(err) = state.status_store.delete_status(&path.device_id).await {
        tracing::warn!(target: "bms_api", device_id = %path.device_id, error = %err, "status cleanup failed");
    }
    if let Err(err) = state.rule_store.delete_rules_for_device(&path.device_id).await {
        tracing::warn!(target: "bms_api", device_id = %path.device_id, error = %err, "rule cleanup failed");
    }
    tracing::info!(
        target: "bms_api",
        device_id = %path.device_id,
        actor = %ctx.user_id,
        "device deleted"
    );
    (StatusCode::OK, Json(ApiResponse::success(()))).into_response()
}

/// 认领设备到位置
pub async fn claim_device(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    headers: HeaderMap,
    Json(req): Json<ClaimDeviceRequest>,
) -> Response {
    if let Err(response) = require_manage(&state, &headers).await {
        return response;
    }
    let location_id = match normalize_required(req.location_id, "locationId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.location_store.find_location(&location_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return bad_request_error("location not found"),
        Err(err) => return storage_error(err),
    }

    match state
        .device_store
        .set_location(&path.device_id, Some(&location_id))
        .await
    {
        Ok(Some(item)) => {
            let status = state
                .status_store
                .get_status(&item.device_id)
                .await
                .unwrap_or(None);
            (
                StatusCode::OK,
                Json(ApiResponse::success(device_to_dto(item, status))),
            )
                .into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

/// 取消认领（设备回到仅管理员可见）
pub async fn unclaim_device(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_manage(&state, &headers).await {
        return response;
    }
    match state.device_store.set_location(&path.device_id, None).await {
        Ok(Some(item)) => {
            let status = state
                .status_store
                .get_status(&item.device_id)
                .await
                .unwrap_or(None);
            (
                StatusCode::OK,
                Json(ApiResponse::success(device_to_dto(item, status))),
            )
                .into_response()
        }
        Ok(None) => not_found_error(),
        Err(err) => storage_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};
    use bms_access::RoleResolver;
    use bms_auth::{AuthService, JwtManager};
    use bms_automation::rules::RulePlanner;
    use bms_automation::{AutomationService, ShedConfig};
    use bms_control::CommandGate;
    use bms_energy::EnergyMeter;
    use bms_runtime::{NoopDispatcher, RuntimePolicy, RuntimeTracker};
    use bms_storage::{
        InMemoryAutomationRuleStore, InMemoryAutomationStateStore, InMemoryBuildingStore,
        InMemoryDeviceEventStore, InMemoryDeviceStore, InMemoryEnergyUsageStore,
        InMemoryLiveStatusStore, InMemoryLocationStore, InMemoryRoleStore, InMemoryUserStore,
    };
    use domain::UserContext;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;

    fn build_state() -> AppState {
        let user_store = Arc::new(InMemoryUserStore::with_default_admin("hash"));
        let building_store = Arc::new(InMemoryBuildingStore::new());
        let location_store = Arc::new(InMemoryLocationStore::new());
        let role_store = Arc::new(InMemoryRoleStore::new());
        let device_store = Arc::new(InMemoryDeviceStore::new());
        let status_store = Arc::new(InMemoryLiveStatusStore::new());
        let automation_store = Arc::new(InMemoryAutomationStateStore::new());
        let event_store = Arc::new(InMemoryDeviceEventStore::new());
        let rule_store = Arc::new(InMemoryAutomationRuleStore::new());
        let energy_store = Arc::new(InMemoryEnergyUsageStore::new());

        let jwt = JwtManager::new("secret".to_string(), 3600, 3600);
        let auth = Arc::new(AuthService::new(user_store.clone(), jwt));
        let resolver = Arc::new(RoleResolver::new(
            user_store.clone(),
            role_store.clone(),
            location_store.clone(),
            building_store.clone(),
        ));
        let runtime = Arc::new(RuntimeTracker::new(
            device_store.clone(),
            status_store.clone(),
            location_store.clone(),
            building_store.clone(),
            Arc::new(NoopDispatcher),
            RuntimePolicy::default(),
        ));
        let energy = Arc::new(EnergyMeter::new(energy_store.clone()));
        let gate = Arc::new(CommandGate::new(
            resolver.clone(),
            device_store.clone(),
            status_store.clone(),
            location_store.clone(),
            automation_store.clone(),
            event_store.clone(),
            runtime.clone(),
            energy,
            Duration::from_millis(2000),
        ));
        let automation = Arc::new(AutomationService::new(
            automation_store.clone(),
            building_store.clone(),
            device_store.clone(),
            status_store.clone(),
            location_store.clone(),
            gate.clone(),
            ShedConfig::default(),
        ));
        let planner = Arc::new(RulePlanner::new(event_store.clone(), rule_store.clone()));

        AppState {
            auth,
            resolver,
            gate,
            automation,
            runtime,
            planner,
            user_store,
            building_store,
            location_store,
            role_store,
            device_store,
            status_store,
            event_store,
            rule_store,
            energy_store,
        }
    }

    fn headers_for(ctx: &UserContext) -> HeaderMap {
        let jwt = JwtManager::new("secret".to_string(), 3600, 3600);
        let tokens = jwt.issue_tokens(ctx).expect("tokens");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", tokens.access_token)).expect("header"),
        );
        headers
    }

    #[tokio::test]
    async fn admin_creates_and_lists_device() {
        let state = build_state();
        let headers = headers_for(&UserContext::new("user-admin", "admin@local", true));

        let response = create_device(
            State(state.clone()),
            headers.clone(),
            Json(CreateDeviceRequest {
                name: "Ceiling Fan".to_string(),
                device_type: "Fan".to_string(),
                wattage_w: Some(60),
                location_id: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = list_devices(State(state), headers).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        let items = value["data"].as_array().expect("array");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Ceiling Fan");
        assert_eq!(items[0]["status"], "OFF");
    }

    #[tokio::test]
    async fn create_device_requires_manage_capability() {
        let state = build_state();
        let headers = headers_for(&UserContext::new("user-2", "child@local", false));

        let response = create_device(
            State(state),
            headers,
            Json(CreateDeviceRequest {
                name: "Heater".to_string(),
                device_type: "Heater".to_string(),
                wattage_w: Some(1500),
                location_id: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
