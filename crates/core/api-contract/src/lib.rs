//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 登录请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 登录响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub is_system_administrator: bool,
}

/// 刷新 token 请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

/// 刷新 token 响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires: u64,
}

/// 楼宇创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingRequest {
    pub name: String,
}

/// 楼宇返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingDto {
    pub building_id: String,
    pub name: String,
    /// 请求者在该楼宇的角色（parent/children/none）。
    pub role: String,
}

/// 位置创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    pub name: String,
}

/// 位置返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub location_id: String,
    pub building_id: String,
    pub name: String,
}

/// 设备创建请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeviceRequest {
    pub name: String,
    pub device_type: String,
    pub wattage_w: Option<i64>,
    pub location_id: Option<String>,
}

/// 设备认领请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDeviceRequest {
    pub location_id: String,
}

/// 设备返回结构（持久属性 + 实时状态合并视图）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub wattage_w: i64,
    pub location_id: Option<String>,
    pub status: String,
    pub on_since_ms: Option<i64>,
    pub warning_count: u32,
}

/// 设备命令请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// turn-on / turn-off / toggle
    pub action: String,
}

/// 命令接受后的返回结构。拒绝走错误封装，不走该结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResultDto {
    pub device_id: String,
    pub new_status: String,
}

/// 自动化模式设置请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAutomationRequest {
    /// none / lockdown / eco / night
    pub mode: String,
}

/// 楼宇自动化状态返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStateDto {
    pub building_id: String,
    pub mode: String,
    pub enabled: bool,
    pub modified_by: String,
    pub modified_at_ms: i64,
}

/// 楼宇自动化统计返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationStatisticsDto {
    pub building_id: String,
    pub total_devices: u64,
    pub devices_on: u64,
    pub devices_off: u64,
    pub mode: String,
    pub mode_title: String,
    pub modified_by: String,
    pub modified_at_ms: i64,
}

/// 设备事件查询参数。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub limit: Option<i64>,
}

/// 设备事件返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub event_id: String,
    pub device_id: String,
    pub action: String,
    pub resulting_status: String,
    pub origin: String,
    pub actor: String,
    pub ts_ms: i64,
}

/// 运行时长巡检返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReportDto {
    pub checked: u64,
    pub warnings_sent: u64,
}

/// 指标快照返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDto {
    pub commands_received: u64,
    pub commands_accepted: u64,
    pub commands_rejected: u64,
    pub runtime_warnings_sent: u64,
    pub runtime_sweeps: u64,
    pub event_append_failures: u64,
    pub automation_mode_changes: u64,
    pub bulk_shed_actions: u64,
    pub energy_accruals: u64,
}
