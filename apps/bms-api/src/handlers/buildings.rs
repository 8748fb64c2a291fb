//! 楼宇 handlers
//!
//! - GET /buildings - 列出楼宇（管理员看全部，其他用户看持有角色的楼宇）
//! - POST /buildings - 创建楼宇（仅系统管理员）

use crate::AppState;
use crate::middleware::{require_admin, require_user_context};
use crate::utils::normalize_required;
use crate::utils::response::{access_error, storage_error};
use api_contract::{ApiResponse, BuildingDto, CreateBuildingRequest};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bms_storage::BuildingRecord;
use domain::BuildingRole;
use uuid::Uuid;

/// 列出楼宇
pub async fn list_buildings(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    let buildings = match state.building_store.list_buildings().await {
        Ok(items) => items,
        Err(err) => return storage_error(err),
    };

    let mut data = Vec::new();
    for building in buildings {
        let role = match state
            .resolver
            .role_in_building(&ctx.user_id, &building.building_id)
            .await
        {
            Ok(record) => record.role,
            Err(err) => return access_error(err),
        };
        // 非管理员只看到自己持有角色的楼宇
        if !ctx.is_system_administrator && role == BuildingRole::None {
            continue;
        }
        data.push(BuildingDto {
            building_id: building.building_id,
            name: building.name,
            role: role.as_str().to_string(),
        });
    }
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 创建楼宇（仅系统管理员）
pub async fn create_building(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateBuildingRequest>,
) -> Response {
    let ctx = match require_admin(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let name = match normalize_required(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let record = BuildingRecord {
        building_id: Uuid::new_v4().to_string(),
        name,
    };
    match state.building_store.create_building(record).await {
        Ok(item) => {
            tracing::info!(
                target: "bms_api",
                building_id = %item.building_id,
                actor = %ctx.user_id,
                "building created"
            );
            let dto = BuildingDto {
                building_id: item.building_id,
                name: item.name,
                role: BuildingRole::None.as_str().to_string(),
            };
            (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
        }
        Err(err) => storage_error(err),
    }
}
