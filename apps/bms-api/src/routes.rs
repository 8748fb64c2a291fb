//! 路由定义
//!
//! 集中管理所有 API 路由，将路径映射到对应的 handlers。
//! 路由包括：
//! - 健康检查：/health
//! - 认证接口：/login, /refresh-token
//! - 楼宇管理：/buildings/*
//! - 位置管理：/buildings/{id}/locations
//! - 自动化：/buildings/{id}/automation/*
//! - 设备管理：/devices/*
//! - 设备命令与事件：/devices/{id}/commands, /devices/{id}/events
//! - 运维接口：/runtime/sweep, /metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/buildings", get(list_buildings).post(create_building))
        .route(
            "/buildings/:building_id/locations",
            get(list_locations).post(create_location),
        )
        .route(
            "/buildings/:building_id/automation",
            get(get_automation)
                .put(set_automation)
                .delete(clear_automation),
        )
        .route(
            "/buildings/:building_id/automation/statistics",
            get(automation_statistics),
        )
        .route(
            "/buildings/:building_id/automation/rules/plan",
            post(plan_automation_rules),
        )
        .route("/devices", get(list_devices).post(create_device))
        .route(
            "/devices/:device_id",
            get(get_device).delete(delete_device),
        )
        .route("/devices/:device_id/claim", post(claim_device))
        .route("/devices/:device_id/unclaim", post(unclaim_device))
        .route("/devices/:device_id/commands", post(issue_command))
        .route("/devices/:device_id/events", get(list_events))
        .route("/runtime/sweep", post(trigger_sweep))
        .route("/metrics", get(metrics))
}
