//! 设备事件 handler
//!
//! - GET /devices/{id}/events - 按时间倒序查询设备事件（可见性检查）

use crate::AppState;
use crate::handlers::devices::DevicePath;
use crate::middleware::require_user_context;
use crate::utils::response::{
    access_error, event_to_dto, forbidden_error, not_found_error, storage_error,
};
use api_contract::{ApiResponse, EventDto, EventsQuery};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

/// 未指定 limit 时的默认条数。
const DEFAULT_EVENT_LIMIT: i64 = 100;

/// 查询设备事件
pub async fn list_events(
    State(state): State<AppState>,
    Path(path): Path<DevicePath>,
    Query(query): Query<EventsQuery>,
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

    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT).max(0);
    match state
        .event_store
        .list_events(&path.device_id, query.from_ms, query.to_ms, limit)
        .await
    {
        Ok(items) => {
            let data: Vec<EventDto> = items.into_iter().map(event_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}
