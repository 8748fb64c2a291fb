//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
///
/// 运行时长告警的策略常量（5 小时首警、每 2 小时升级、1.5 小时防抖）
/// 可通过环境变量覆盖，默认值与既有行为保持一致。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub jwt_secret: String,
    pub jwt_access_ttl_seconds: u64,
    pub jwt_refresh_ttl_seconds: u64,
    /// 授权门访问目录/存储的有界超时（毫秒），超时按失败关闭处理。
    pub dependency_timeout_ms: u64,
    /// 后台巡检间隔（秒）。
    pub sweep_interval_seconds: u64,
    pub runtime_first_warning_hours: u64,
    pub runtime_escalation_hours: u64,
    pub runtime_warning_gap_minutes: u64,
    /// eco 模式一次性关断的设备类型。
    pub eco_shed_types: Vec<String>,
    /// night 模式一次性关断的设备类型。
    pub night_shed_types: Vec<String>,
    /// 是否在后台巡检中执行设备级自动化规则。
    pub rules_enabled: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("BMS_JWT_SECRET")
            .map_err(|_| ConfigError::Missing("BMS_JWT_SECRET".to_string()))?;
        let jwt_access_ttl_seconds = read_u64("BMS_JWT_ACCESS_TTL_SECONDS")?;
        let jwt_refresh_ttl_seconds = read_u64("BMS_JWT_REFRESH_TTL_SECONDS")?;
        let http_addr = env::var("BMS_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let dependency_timeout_ms = read_u64_with_default("BMS_DEPENDENCY_TIMEOUT_MS", 2_000)?;
        let sweep_interval_seconds = read_u64_with_default("BMS_SWEEP_INTERVAL_SECONDS", 60)?;
        let runtime_first_warning_hours =
            read_u64_with_default("BMS_RUNTIME_FIRST_WARNING_HOURS", 5)?;
        let runtime_escalation_hours = read_u64_with_default("BMS_RUNTIME_ESCALATION_HOURS", 2)?;
        let runtime_warning_gap_minutes =
            read_u64_with_default("BMS_RUNTIME_WARNING_GAP_MINUTES", 90)?;
        let eco_shed_types = read_csv_with_default("BMS_ECO_SHED_TYPES", &["AC"]);
        let night_shed_types = read_csv_with_default("BMS_NIGHT_SHED_TYPES", &["Fan", "AC"]);
        let rules_enabled = read_bool_with_default("BMS_RULES_ENABLED", false);

        Ok(Self {
            http_addr,
            jwt_secret,
            jwt_access_ttl_seconds,
            jwt_refresh_ttl_seconds,
            dependency_timeout_ms,
            sweep_interval_seconds,
            runtime_first_warning_hours,
            runtime_escalation_hours,
            runtime_warning_gap_minutes,
            eco_shed_types,
            night_shed_types,
            rules_enabled,
        })
    }
}

fn read_u64(key: &str) -> Result<u64, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))?;
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        Err(_) => Ok(default),
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn read_csv_with_default(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(value) => value
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Err(_) => default.iter().map(|item| item.to_string()).collect(),
    }
}
