//! 追踪与请求 ID 生成。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 基础指标。
pub struct TelemetryMetrics {
    commands_received: AtomicU64,
    commands_accepted: AtomicU64,
    commands_rejected: AtomicU64,
    runtime_warnings_sent: AtomicU64,
    runtime_sweeps: AtomicU64,
    event_append_failures: AtomicU64,
    automation_mode_changes: AtomicU64,
    bulk_shed_actions: AtomicU64,
    energy_accruals: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            commands_received: AtomicU64::new(0),
            commands_accepted: AtomicU64::new(0),
            commands_rejected: AtomicU64::new(0),
            runtime_warnings_sent: AtomicU64::new(0),
            runtime_sweeps: AtomicU64::new(0),
            event_append_failures: AtomicU64::new(0),
            automation_mode_changes: AtomicU64::new(0),
            bulk_shed_actions: AtomicU64::new(0),
            energy_accruals: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands_received: self.commands_received.load(Ordering::Relaxed),
            commands_accepted: self.commands_accepted.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            runtime_warnings_sent: self.runtime_warnings_sent.load(Ordering::Relaxed),
            runtime_sweeps: self.runtime_sweeps.load(Ordering::Relaxed),
            event_append_failures: self.event_append_failures.load(Ordering::Relaxed),
            automation_mode_changes: self.automation_mode_changes.load(Ordering::Relaxed),
            bulk_shed_actions: self.bulk_shed_actions.load(Ordering::Relaxed),
            energy_accruals: self.energy_accruals.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录收到的设备命令次数。
pub fn record_command_received() {
    metrics().commands_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录通过授权门并落盘的命令次数。
pub fn record_command_accepted() {
    metrics().commands_accepted.fetch_add(1, Ordering::Relaxed);
}

/// 记录被拒绝的命令次数。
pub fn record_command_rejected() {
    metrics().commands_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录发出的运行时长告警次数。
pub fn record_runtime_warning_sent() {
    metrics()
        .runtime_warnings_sent
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录运行时长巡检轮次。
pub fn record_runtime_sweep() {
    metrics().runtime_sweeps.fetch_add(1, Ordering::Relaxed);
}

/// 记录事件追加失败次数（含重试后仍失败）。
pub fn record_event_append_failure() {
    metrics()
        .event_append_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录楼宇自动化模式切换次数。
pub fn record_automation_mode_change() {
    metrics()
        .automation_mode_changes
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录自动化批量关断动作次数。
pub fn record_bulk_shed_action() {
    metrics().bulk_shed_actions.fetch_add(1, Ordering::Relaxed);
}

/// 记录能耗累计写入次数。
pub fn record_energy_accrual() {
    metrics().energy_accruals.fetch_add(1, Ordering::Relaxed);
}
