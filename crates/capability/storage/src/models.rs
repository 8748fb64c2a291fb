//! 数据模型
//!
//! 定义所有存储相关的数据模型：
//! - 用户模型：UserRecord
//! - 楼宇层级：BuildingRecord, LocationRecord
//! - 角色模型：UserBuildingRoleRecord（(user, building) 至多一条）
//! - 设备模型：DeviceRecord（持久属性）、LiveStatusRecord（实时状态）
//! - 自动化模型：AutomationStateRecord, AutomationRuleRecord
//! - 事件模型：DeviceEventRecord（只追加，设备删除后仍保留）
//! - 能耗模型：EnergyDailyRecord

use domain::{AutomationMode, BuildingRole, CommandAction, DeviceStatus, EventOrigin};

/// 用户记录。
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub is_system_administrator: bool,
    pub refresh_jti: Option<String>,
}

impl UserRecord {
    /// 将用户记录转换为请求者上下文。
    pub fn to_user_context(&self) -> domain::UserContext {
        domain::UserContext::new(
            self.user_id.clone(),
            self.email.clone(),
            self.is_system_administrator,
        )
    }
}

/// 楼宇记录。
#[derive(Debug, Clone)]
pub struct BuildingRecord {
    pub building_id: String,
    pub name: String,
}

/// 位置记录。楼宇引用必须可解析，读取方解析失败时按不可访问处理。
#[derive(Debug, Clone)]
pub struct LocationRecord {
    pub location_id: String,
    pub building_id: String,
    pub name: String,
}

/// 用户-楼宇角色记录。
///
/// `assigned_locations` 仅在 role = children 时有意义。
#[derive(Debug, Clone)]
pub struct UserBuildingRoleRecord {
    pub user_id: String,
    pub building_id: String,
    pub role: BuildingRole,
    pub assigned_locations: Vec<String>,
}

impl UserBuildingRoleRecord {
    /// 角色记录缺失时的等价默认值（role = none）。
    pub fn none(user_id: impl Into<String>, building_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            building_id: building_id.into(),
            role: BuildingRole::None,
            assigned_locations: Vec::new(),
        }
    }
}

/// 设备持久属性记录。
///
/// `location_id = None` 表示未认领（仅系统管理员可见）。
/// `assigned_to` 为旧版直挂用户回退通道。
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    pub wattage_w: i64,
    pub location_id: Option<String>,
    pub assigned_to: Vec<String>,
}

impl DeviceRecord {
    pub fn is_claimed(&self) -> bool {
        self.location_id.is_some()
    }
}

/// 设备实时状态记录。
///
/// 不变式：`status == On` 当且仅当 `on_since_ms` 非空；
/// 转为 Off 时三个运行时字段一并清零。
/// `version` 单调递增，写入走比较交换。
#[derive(Debug, Clone)]
pub struct LiveStatusRecord {
    pub device_id: String,
    pub status: DeviceStatus,
    pub on_since_ms: Option<i64>,
    pub last_warning_at_ms: Option<i64>,
    pub warning_count: u32,
    pub version: u64,
}

impl LiveStatusRecord {
    /// 设备的初始（OFF）状态。
    pub fn initial(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            status: DeviceStatus::Off,
            on_since_ms: None,
            last_warning_at_ms: None,
            warning_count: 0,
            version: 0,
        }
    }
}

/// 实时状态写入结果。`applied = false` 表示版本冲突，记录为存储中的当前值。
#[derive(Debug, Clone)]
pub struct StatusWriteResult {
    pub record: LiveStatusRecord,
    pub applied: bool,
}

/// 楼宇自动化状态记录。每栋楼宇一条，模式互斥由单记录结构保证。
#[derive(Debug, Clone)]
pub struct AutomationStateRecord {
    pub building_id: String,
    pub mode: AutomationMode,
    pub modified_by: String,
    pub modified_at_ms: i64,
}

impl AutomationStateRecord {
    /// 无记录时的隐式默认状态（mode = none）。
    pub fn default_for(building_id: impl Into<String>) -> Self {
        Self {
            building_id: building_id.into(),
            mode: AutomationMode::None,
            modified_by: "".to_string(),
            modified_at_ms: 0,
        }
    }

    /// 是否有激活的自动化（派生值）。
    pub fn enabled(&self) -> bool {
        self.mode.enabled()
    }
}

/// 设备事件记录。只追加，不修改不删除。
#[derive(Debug, Clone)]
pub struct DeviceEventRecord {
    pub event_id: String,
    pub device_id: String,
    pub action: String,
    pub resulting_status: DeviceStatus,
    pub origin: EventOrigin,
    pub actor: String,
    pub ts_ms: i64,
}

impl DeviceEventRecord {
    /// 命令事件的标准 action 编码。
    pub fn action_for(action: CommandAction) -> String {
        action.as_str().to_string()
    }
}

/// 设备级自动化规则（由历史事件推导）。
#[derive(Debug, Clone)]
pub struct AutomationRuleRecord {
    pub device_id: String,
    /// 开启小时（0-23）。
    pub start_hour: u8,
    /// 关闭小时（0-23）。
    pub end_hour: u8,
    /// 生效的星期名集合（"Monday" 等）。
    pub days: Vec<String>,
    pub enabled: bool,
    pub source: String,
    pub based_on_events: u32,
    pub created_at_ms: i64,
    pub modified_at_ms: i64,
}

/// 设备按日能耗记录。
#[derive(Debug, Clone)]
pub struct EnergyDailyRecord {
    pub device_id: String,
    /// 日期（YYYY-MM-DD）。
    pub date: String,
    pub usage_kwh: f64,
    pub device_wattage_w: i64,
    pub last_updated_ms: i64,
}
