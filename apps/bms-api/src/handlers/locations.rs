//! 位置 handlers
//!
//! - GET /buildings/{id}/locations - 列出楼宇下的位置（需在该楼宇持有角色）
//! - POST /buildings/{id}/locations - 创建位置（管理员或该楼宇 parent）

use crate::AppState;
use crate::middleware::require_user_context;
use crate::utils::normalize_required;
use crate::utils::response::{
    access_error, forbidden_error, not_found_error, storage_error,
};
use api_contract::{ApiResponse, CreateLocationRequest, LocationDto};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bms_storage::LocationRecord;
use domain::BuildingRole;
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct BuildingPath {
    pub building_id: String,
}

/// 列出楼宇下的位置
pub async fn list_locations(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.building_store.find_building(&path.building_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    }
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

    match state.location_store.list_locations(&path.building_id).await {
        Ok(items) => {
            let data: Vec<LocationDto> = items
                .into_iter()
                .map(|record| LocationDto {
                    location_id: record.location_id,
                    building_id: record.building_id,
                    name: record.name,
                })
                .collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 创建位置（管理员或该楼宇 parent）
pub async fn create_location(
    State(state): State<AppState>,
    Path(path): Path<BuildingPath>,
    headers: HeaderMap,
    Json(req): Json<CreateLocationRequest>,
) -> Response {
    let ctx = match require_user_context(&state, &headers) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    match state.building_store.find_building(&path.building_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found_error(),
        Err(err) => return storage_error(err),
    }
    if !ctx.is_system_administrator {
        let role = match state
            .resolver
            .role_in_building(&ctx.user_id, &path.building_id)
            .await
        {
            Ok(record) => record.role,
            Err(err) => return access_error(err),
        };
        if role != BuildingRole::Parent {
            return forbidden_error();
        }
    }
    let name = match normalize_required(req.name, "name") {
        Ok(value) => value,
        Err(response) => return response,
    };

    let record = LocationRecord {
        location_id: Uuid::new_v4().to_string(),
        building_id: path.building_id,
        name,
    };
    match state.location_store.create_location(record).await {
        Ok(item) => {
            let dto = LocationDto {
                location_id: item.location_id,
                building_id: item.building_id,
                name: item.name,
            };
            (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
        }
        Err(err) => storage_error(err),
    }
}
