//! 领域枚举类型
//!
//! 所有从远端存储读入的松散字符串在此显式解析：
//! - 未知取值一律返回 `None`，由调用方拒绝，不允许静默降级
//! - 每个枚举提供 `as_str`/`parse` 稳定编码

/// 设备实时状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    On,
    Off,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// 解析状态字符串（大小写不敏感）。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    /// 翻转状态（toggle 命令使用）。
    pub fn flipped(&self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

/// 设备命令动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    TurnOn,
    TurnOff,
    Toggle,
}

impl CommandAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn-on",
            Self::TurnOff => "turn-off",
            Self::Toggle => "toggle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "turn-on" => Some(Self::TurnOn),
            "turn-off" => Some(Self::TurnOff),
            "toggle" => Some(Self::Toggle),
            _ => None,
        }
    }
}

/// 楼宇自动化模式。
///
/// 每栋楼宇同一时刻只有一个激活模式；`none` 表示无任何限制。
/// 只有 `lockdown` 对后续命令有拦截效果，`eco`/`night`
/// 是启用瞬间的一次性批量动作加标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutomationMode {
    #[default]
    None,
    Lockdown,
    Eco,
    Night,
}

impl AutomationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lockdown => "lockdown",
            Self::Eco => "eco",
            Self::Night => "night",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "lockdown" => Some(Self::Lockdown),
            "eco" => Some(Self::Eco),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    /// 是否有激活的自动化（派生值：mode ≠ none）。
    pub fn enabled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// 报表展示用的模式名称。
    pub fn title(&self) -> &'static str {
        match self {
            Self::None => "No Automation",
            Self::Lockdown => "Lockdown",
            Self::Eco => "Eco Mode",
            Self::Night => "Night Mode",
        }
    }
}

/// 设备事件来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Manual,
    Automation,
    System,
}

impl EventOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automation => "automation",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Some(Self::Manual),
            "automation" => Some(Self::Automation),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// 用户在某栋楼宇内的角色。
///
/// 角色记录缺失等价于 `None`（无权限）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildingRole {
    Parent,
    Children,
    #[default]
    None,
}

impl BuildingRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Children => "children",
            Self::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "parent" => Some(Self::Parent),
            "children" => Some(Self::Children),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}
