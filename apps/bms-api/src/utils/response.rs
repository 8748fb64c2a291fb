//! HTTP 响应辅助函数和 DTO 转换
//!
//! 设计原则：
//! - 所有错误返回统一的 ApiResponse 格式
//! - HTTP 状态码与错误码对应
//! - 命令拒绝使用授权门的稳定拒绝码，其余错误使用通用错误码

use api_contract::{
    ApiResponse, AutomationStateDto, AutomationStatisticsDto, DeviceDto, EventDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bms_access::AccessError;
use bms_auth::AuthError;
use bms_automation::AutomationStatistics;
use bms_control::RejectionCode;
use bms_storage::{
    AutomationStateRecord, DeviceEventRecord, DeviceRecord, LiveStatusRecord, StorageError,
};

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(
            "AUTH.UNAUTHORIZED",
            "unauthorized",
        )),
    )
        .into_response()
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ApiResponse::<()>::error("AUTH.FORBIDDEN", "forbidden")),
    )
        .into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// 认证内部错误响应
pub fn internal_auth_error(err: AuthError) -> Response {
    let message = err.to_string();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message)),
    )
        .into_response()
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    internal_error(err.to_string())
}

/// 通用内部错误响应
pub fn internal_error(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message.into())),
    )
        .into_response()
}

/// 权限解析失败响应：按校验失败拒绝（fail closed）
pub fn access_error(err: AccessError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(
            RejectionCode::ValidationError.as_str(),
            err.to_string(),
        )),
    )
        .into_response()
}

/// 命令拒绝响应：拒绝码映射 HTTP 状态码
pub fn command_rejection(code: RejectionCode, reason: String) -> Response {
    let status = match code {
        RejectionCode::NotAuthorized => StatusCode::FORBIDDEN,
        RejectionCode::DeviceLocked => StatusCode::CONFLICT,
        RejectionCode::DeviceNotFound => StatusCode::NOT_FOUND,
        RejectionCode::ValidationError => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ApiResponse::<()>::error(code.as_str(), reason)),
    )
        .into_response()
}

/// DeviceRecord + LiveStatusRecord 合并为 DeviceDto
pub fn device_to_dto(record: DeviceRecord, status: Option<LiveStatusRecord>) -> DeviceDto {
    let status = status.unwrap_or_else(|| LiveStatusRecord::initial(&record.device_id));
    DeviceDto {
        device_id: record.device_id,
        name: record.name,
        device_type: record.device_type,
        wattage_w: record.wattage_w,
        location_id: record.location_id,
        status: status.status.as_str().to_string(),
        on_since_ms: status.on_since_ms,
        warning_count: status.warning_count,
    }
}

/// AutomationStateRecord 转 AutomationStateDto
pub fn automation_state_to_dto(record: AutomationStateRecord) -> AutomationStateDto {
    AutomationStateDto {
        building_id: record.building_id,
        mode: record.mode.as_str().to_string(),
        enabled: record.mode.enabled(),
        modified_by: record.modified_by,
        modified_at_ms: record.modified_at_ms,
    }
}

/// AutomationStatistics 转 AutomationStatisticsDto
pub fn statistics_to_dto(stats: AutomationStatistics) -> AutomationStatisticsDto {
    AutomationStatisticsDto {
        building_id: stats.building_id,
        total_devices: stats.total_devices,
        devices_on: stats.devices_on,
        devices_off: stats.devices_off,
        mode: stats.mode.as_str().to_string(),
        mode_title: stats.mode_title,
        modified_by: stats.modified_by,
        modified_at_ms: stats.modified_at_ms,
    }
}

/// DeviceEventRecord 转 EventDto
pub fn event_to_dto(record: DeviceEventRecord) -> EventDto {
    EventDto {
        event_id: record.event_id,
        device_id: record.device_id,
        action: record.action,
        resulting_status: record.resulting_status.as_str().to_string(),
        origin: record.origin.as_str().to_string(),
        actor: record.actor,
        ts_ms: record.ts_ms,
    }
}
