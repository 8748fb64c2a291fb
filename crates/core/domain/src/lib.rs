pub mod model;

pub use model::{AutomationMode, BuildingRole, CommandAction, DeviceStatus, EventOrigin};

/// 请求者上下文：所有能力模块共享的执行身份。
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
    pub email: String,
    pub is_system_administrator: bool,
}

impl UserContext {
    /// 构造显式身份的请求者上下文。
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        is_system_administrator: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            is_system_administrator,
        }
    }

    /// 自动化/后台任务使用的系统身份。
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            email: "system".to_string(),
            is_system_administrator: true,
        }
    }
}

impl Default for UserContext {
    /// 空上下文（仅用于测试或占位）。
    fn default() -> Self {
        Self {
            user_id: "".to_string(),
            email: "".to_string(),
            is_system_administrator: false,
        }
    }
}
