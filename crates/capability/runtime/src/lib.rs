//! 运行时长追踪能力：长时间开机告警与升级调度。
//!
//! 规则：
//! - 首次告警阈值 5 小时，此后每 2 小时升级一次（5h、7h、9h…）
//! - 相邻两次告警至少间隔 90 分钟（防骚扰）
//! - 只有授权门的 Off 转换会清零计数，本模块从不改变设备开关状态
//! - 告警状态通过版本化比较交换落盘，与命令路径并发安全

use bms_storage::{
    BuildingStore, DeviceRecord, DeviceStore, LiveStatusStore, LocationStore, StorageError,
};
use domain::DeviceStatus;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// 运行时长追踪错误。
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for RuntimeError {
    fn from(err: StorageError) -> Self {
        RuntimeError::Storage(err.to_string())
    }
}

/// 告警调度参数。
#[derive(Debug, Clone)]
pub struct RuntimePolicy {
    /// 首次告警阈值（小时）。
    pub first_warning_hours: u64,
    /// 升级间隔（小时）。
    pub escalation_interval_hours: u64,
    /// 相邻告警最小间隔（分钟）。
    pub min_warning_gap_minutes: u64,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self {
            first_warning_hours: 5,
            escalation_interval_hours: 2,
            min_warning_gap_minutes: 90,
        }
    }
}

/// 一次运行时长告警的完整上下文。
#[derive(Debug, Clone)]
pub struct RuntimeWarning {
    pub device_id: String,
    pub device_name: String,
    pub location_name: String,
    pub building_id: String,
    pub building_name: String,
    pub hours_on: u64,
    /// 第几次告警（从 1 开始）。
    pub warning_ordinal: u32,
}

/// 告警投递接口。实际投递通道（邮件/推送）不在本仓库范围内。
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_runtime_warning(&self, warning: &RuntimeWarning) -> Result<(), RuntimeError>;
}

/// 以结构化日志形式投递告警。
pub struct TracingDispatcher;

#[async_trait::async_trait]
impl NotificationDispatcher for TracingDispatcher {
    async fn send_runtime_warning(&self, warning: &RuntimeWarning) -> Result<(), RuntimeError> {
        tracing::warn!(
            target: "bms_runtime",
            device_id = %warning.device_id,
            device_name = %warning.device_name,
            location = %warning.location_name,
            building = %warning.building_name,
            hours_on = warning.hours_on,
            warning_ordinal = warning.warning_ordinal,
            "device has been on for an extended period"
        );
        Ok(())
    }
}

/// 不做任何事的投递实现（测试用）。
pub struct NoopDispatcher;

#[async_trait::async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn send_runtime_warning(&self, _warning: &RuntimeWarning) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// 单设备一次评估的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluateOutcome {
    /// 设备关机、未认领或不存在，本轮无事可做。
    Skipped,
    /// 开机但缺少 on_since，补记起点，本轮不告警。
    Initialized,
    /// 未到告警条件。
    NotDue,
    /// 已发出告警并更新计数。
    Warned { hours_on: u64, warning_ordinal: u32 },
    /// 版本冲突，另一写入方先行，留待下轮。
    Conflicted,
}

/// 批量巡检汇总。
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub checked: u64,
    pub warnings_sent: u64,
}

/// 运行时长追踪器。
pub struct RuntimeTracker {
    device_store: Arc<dyn DeviceStore>,
    status_store: Arc<dyn LiveStatusStore>,
    location_store: Arc<dyn LocationStore>,
    building_store: Arc<dyn BuildingStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    policy: RuntimePolicy,
}

impl RuntimeTracker {
    pub fn new(
        device_store: Arc<dyn DeviceStore>,
        status_store: Arc<dyn LiveStatusStore>,
        location_store: Arc<dyn LocationStore>,
        building_store: Arc<dyn BuildingStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        policy: RuntimePolicy,
    ) -> Self {
        Self {
            device_store,
            status_store,
            location_store,
            building_store,
            dispatcher,
            policy,
        }
    }

    /// 评估单个设备（当前时间）。
    pub async fn evaluate(&self, device_id: &str) -> Result<EvaluateOutcome, RuntimeError> {
        self.evaluate_at(device_id, now_epoch_ms()).await
    }

    /// 评估单个设备（指定时间，测试可控时钟）。
    pub async fn evaluate_at(
        &self,
        device_id: &str,
        now_ms: i64,
    ) -> Result<EvaluateOutcome, RuntimeError> {
        let Some(device) = self.device_store.find_device(device_id).await? else {
            return Ok(EvaluateOutcome::Skipped);
        };
        // 未认领设备没有可通知的楼宇上下文
        if !device.is_claimed() {
            return Ok(EvaluateOutcome::Skipped);
        }
        let Some(status) = self.status_store.get_status(device_id).await? else {
            return Ok(EvaluateOutcome::Skipped);
        };
        if status.status == DeviceStatus::Off {
            return Ok(EvaluateOutcome::Skipped);
        }

        let Some(on_since_ms) = status.on_since_ms else {
            // 开机但起点缺失：补记，不告警
            let mut repaired = status.clone();
            repaired.on_since_ms = Some(now_ms);
            repaired.last_warning_at_ms = None;
            repaired.warning_count = 0;
            let result = self
                .status_store
                .put_status(repaired, Some(status.version))
                .await?;
            return Ok(if result.applied {
                EvaluateOutcome::Initialized
            } else {
                EvaluateOutcome::Conflicted
            });
        };

        let hours_on = ((now_ms - on_since_ms).max(0) as u64) / 3_600_000;
        let threshold = self.policy.first_warning_hours
            + self.policy.escalation_interval_hours * status.warning_count as u64;
        if hours_on < threshold {
            return Ok(EvaluateOutcome::NotDue);
        }
        if let Some(last_ms) = status.last_warning_at_ms {
            let gap_ms = self.policy.min_warning_gap_minutes as i64 * 60_000;
            if status.warning_count > 0 && now_ms - last_ms < gap_ms {
                return Ok(EvaluateOutcome::NotDue);
            }
        }

        let warning = self.build_warning(&device, hours_on, status.warning_count + 1).await?;
        if let Err(err) = self.dispatcher.send_runtime_warning(&warning).await {
            // 投递失败不推进计数，下轮巡检重试
            tracing::warn!(
                target: "bms_runtime",
                device_id = %device.device_id,
                error = %err,
                "runtime warning dispatch failed"
            );
            return Ok(EvaluateOutcome::NotDue);
        }

        let mut updated = status.clone();
        updated.last_warning_at_ms = Some(now_ms);
        updated.warning_count = status.warning_count + 1;
        let result = self
            .status_store
            .put_status(updated, Some(status.version))
            .await?;
        if !result.applied {
            return Ok(EvaluateOutcome::Conflicted);
        }
        bms_telemetry::record_runtime_warning_sent();
        Ok(EvaluateOutcome::Warned {
            hours_on,
            warning_ordinal: status.warning_count + 1,
        })
    }

    /// 批量巡检指定设备集合。幂等，可与命令路径并发。
    pub async fn sweep(&self, device_ids: &[String]) -> Result<SweepReport, RuntimeError> {
        self.sweep_at(device_ids, now_epoch_ms()).await
    }

    /// 批量巡检（指定时间）。
    pub async fn sweep_at(
        &self,
        device_ids: &[String],
        now_ms: i64,
    ) -> Result<SweepReport, RuntimeError> {
        let mut report = SweepReport::default();
        for device_id in device_ids {
            report.checked += 1;
            match self.evaluate_at(device_id, now_ms).await {
                Ok(EvaluateOutcome::Warned { .. }) => report.warnings_sent += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        target: "bms_runtime",
                        device_id = %device_id,
                        error = %err,
                        "runtime evaluation failed"
                    );
                }
            }
        }
        bms_telemetry::record_runtime_sweep();
        tracing::info!(
            target: "bms_runtime",
            checked = report.checked,
            warnings_sent = report.warnings_sent,
            "runtime sweep finished"
        );
        Ok(report)
    }

    /// 解析设备的位置/楼宇名称，组装告警上下文。
    async fn build_warning(
        &self,
        device: &DeviceRecord,
        hours_on: u64,
        warning_ordinal: u32,
    ) -> Result<RuntimeWarning, RuntimeError> {
        let mut location_name = String::new();
        let mut building_id = String::new();
        let mut building_name = String::new();
        if let Some(location_id) = device.location_id.as_deref() {
            if let Some(location) = self.location_store.find_location(location_id).await? {
                location_name = location.name.clone();
                building_id = location.building_id.clone();
                if let Some(building) =
                    self.building_store.find_building(&location.building_id).await?
                {
                    building_name = building.name;
                }
            }
        }
        Ok(RuntimeWarning {
            device_id: device.device_id.clone(),
            device_name: device.name.clone(),
            location_name,
            building_id,
            building_name,
            hours_on,
            warning_ordinal,
        })
    }
}

/// 当前时间戳（毫秒）。
fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or_default()
}
