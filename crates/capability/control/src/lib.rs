//! 命令授权门：设备状态变更的唯一入口。
//!
//! 每次调用走固定状态机：
//! 收到 → 授权检查 → {拒绝 | 策略检查} → {拒绝 | 落盘} → 记录事件。
//!
//! 关键约束：
//! - 授权/策略检查失败一律终态拒绝，门内不重试
//! - 目录或存储超时按校验失败拒绝（fail closed）
//! - lockdown 只拦截开机方向，关机永不被策略拦截，管理员无豁免
//! - 落盘走设备级互斥 + 版本化比较交换，两路并发写不会互相覆盖
//! - 事件追加失败重试一次后仅告警，绝不回滚已生效的状态

use bms_access::RoleResolver;
use bms_energy::EnergyMeter;
use bms_runtime::RuntimeTracker;
use bms_storage::{
    AutomationStateStore, DeviceEventRecord, DeviceEventStore, DeviceRecord, DeviceStore,
    LiveStatusRecord, LiveStatusStore, LocationStore,
};
use domain::{AutomationMode, CommandAction, DeviceStatus, EventOrigin, UserContext};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// lockdown 拒绝开机时返回的原因文案。
const LOCKDOWN_REASON: &str = "building is in lockdown; disable automation to resume manual control";

/// 版本冲突时落盘的最大尝试次数（互斥锁内，冲突仅来自巡检路径）。
const APPLY_ATTEMPTS: u32 = 3;

/// 拒绝码。对外序列化为稳定字符串，HTTP 层据此选状态码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCode {
    NotAuthorized,
    DeviceLocked,
    DeviceNotFound,
    ValidationError,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::NotAuthorized => "NOT_AUTHORIZED",
            RejectionCode::DeviceLocked => "DEVICE_LOCKED",
            RejectionCode::DeviceNotFound => "DEVICE_NOT_FOUND",
            RejectionCode::ValidationError => "VALIDATION_ERROR",
        }
    }
}

/// 一次命令的终态结论。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandDecision {
    Accepted {
        new_status: DeviceStatus,
    },
    Rejected {
        code: RejectionCode,
        reason: String,
    },
}

impl CommandDecision {
    fn rejected(code: RejectionCode, reason: impl Into<String>) -> Self {
        CommandDecision::Rejected {
            code,
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandDecision::Accepted { .. })
    }
}

/// 命令授权门。
pub struct CommandGate {
    resolver: Arc<RoleResolver>,
    device_store: Arc<dyn DeviceStore>,
    status_store: Arc<dyn LiveStatusStore>,
    location_store: Arc<dyn LocationStore>,
    automation_store: Arc<dyn AutomationStateStore>,
    event_store: Arc<dyn DeviceEventStore>,
    runtime: Arc<RuntimeTracker>,
    energy: Arc<EnergyMeter>,
    dependency_timeout: Duration,
    /// 设备级互斥锁，串行化单设备的读-改-写。
    device_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CommandGate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resolver: Arc<RoleResolver>,
        device_store: Arc<dyn DeviceStore>,
        status_store: Arc<dyn LiveStatusStore>,
        location_store: Arc<dyn LocationStore>,
        automation_store: Arc<dyn AutomationStateStore>,
        event_store: Arc<dyn DeviceEventStore>,
        runtime: Arc<RuntimeTracker>,
        energy: Arc<EnergyMeter>,
        dependency_timeout: Duration,
    ) -> Self {
        Self {
            resolver,
            device_store,
            status_store,
            location_store,
            automation_store,
            event_store,
            runtime,
            energy,
            dependency_timeout,
            device_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 处理用户发起的设备命令。
    pub async fn issue_command(
        &self,
        user: &UserContext,
        device_id: &str,
        action: CommandAction,
    ) -> CommandDecision {
        bms_telemetry::record_command_received();
        let decision = self.issue_command_inner(user, device_id, action).await;
        match &decision {
            CommandDecision::Accepted { new_status } => {
                bms_telemetry::record_command_accepted();
                tracing::info!(
                    target: "bms_control",
                    device_id = %device_id,
                    user_id = %user.user_id,
                    action = action.as_str(),
                    new_status = new_status.as_str(),
                    "command accepted"
                );
            }
            CommandDecision::Rejected { code, reason } => {
                bms_telemetry::record_command_rejected();
                tracing::info!(
                    target: "bms_control",
                    device_id = %device_id,
                    user_id = %user.user_id,
                    action = action.as_str(),
                    code = code.as_str(),
                    reason = %reason,
                    "command rejected"
                );
            }
        }
        decision
    }

    async fn issue_command_inner(
        &self,
        user: &UserContext,
        device_id: &str,
        action: CommandAction,
    ) -> CommandDecision {
        let device = match self.device_store.find_device(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                return CommandDecision::rejected(RejectionCode::DeviceNotFound, "unknown device");
            }
            Err(err) => {
                return CommandDecision::rejected(
                    RejectionCode::ValidationError,
                    format!("device lookup failed: {err}"),
                );
            }
        };

        // 授权检查带超时，目录不可达时拒绝而不是放行
        let authorized =
            tokio::time::timeout(self.dependency_timeout, self.resolver.can_control(user, &device))
                .await;
        match authorized {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                return CommandDecision::rejected(
                    RejectionCode::NotAuthorized,
                    "user may not control this device",
                );
            }
            Ok(Err(err)) => {
                return CommandDecision::rejected(
                    RejectionCode::ValidationError,
                    format!("authorization check failed: {err}"),
                );
            }
            Err(_) => {
                return CommandDecision::rejected(
                    RejectionCode::ValidationError,
                    "authorization check timed out",
                );
            }
        }

        self.apply(&device, action, EventOrigin::Manual, &user.user_id, true)
            .await
    }

    /// 自动化路径入口：跳过授权与策略检查，但共享串行化落盘。
    pub async fn apply_system_command(
        &self,
        actor: &str,
        device_id: &str,
        action: CommandAction,
        origin: EventOrigin,
    ) -> CommandDecision {
        let device = match self.device_store.find_device(device_id).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                return CommandDecision::rejected(RejectionCode::DeviceNotFound, "unknown device");
            }
            Err(err) => {
                return CommandDecision::rejected(
                    RejectionCode::ValidationError,
                    format!("device lookup failed: {err}"),
                );
            }
        };
        self.apply(&device, action, origin, actor, false).await
    }

    /// 串行化落盘：设备级互斥 + 版本化比较交换。
    async fn apply(
        &self,
        device: &DeviceRecord,
        action: CommandAction,
        origin: EventOrigin,
        actor: &str,
        enforce_policy: bool,
    ) -> CommandDecision {
        let lock = self.lock_for(&device.device_id);
        let _guard = lock.lock().await;

        let now_ms = now_epoch_ms();
        for _ in 0..APPLY_ATTEMPTS {
            let current = match self.status_store.get_status(&device.device_id).await {
                Ok(value) => value,
                Err(err) => {
                    return CommandDecision::rejected(
                        RejectionCode::ValidationError,
                        format!("status read failed: {err}"),
                    );
                }
            };
            let expected_version = current.as_ref().map(|record| record.version);
            let before = current.unwrap_or_else(|| LiveStatusRecord::initial(&device.device_id));

            let target = match action {
                CommandAction::TurnOn => DeviceStatus::On,
                CommandAction::TurnOff => DeviceStatus::Off,
                CommandAction::Toggle => before.status.flipped(),
            };

            // 策略检查只拦截开机方向；toggle 的方向取决于当前状态。
            // 查询同样有界超时：此处持有设备锁，挂住的存储读不允许
            // 连带卡死该设备的后续命令（包括关机）。
            if enforce_policy && target == DeviceStatus::On {
                let mode =
                    tokio::time::timeout(self.dependency_timeout, self.building_mode(device)).await;
                match mode {
                    Ok(Ok(AutomationMode::Lockdown)) => {
                        return CommandDecision::rejected(
                            RejectionCode::DeviceLocked,
                            LOCKDOWN_REASON,
                        );
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(reason)) => {
                        return CommandDecision::rejected(RejectionCode::ValidationError, reason);
                    }
                    Err(_) => {
                        return CommandDecision::rejected(
                            RejectionCode::ValidationError,
                            "policy check timed out",
                        );
                    }
                }
            }

            let mut next = before.clone();
            next.status = target;
            match target {
                DeviceStatus::On => {
                    if before.status == DeviceStatus::Off {
                        next.on_since_ms = Some(now_ms);
                        next.last_warning_at_ms = None;
                        next.warning_count = 0;
                    }
                }
                DeviceStatus::Off => {
                    next.on_since_ms = None;
                    next.last_warning_at_ms = None;
                    next.warning_count = 0;
                }
            }

            let written = match self.status_store.put_status(next, expected_version).await {
                Ok(result) => result,
                Err(err) => {
                    return CommandDecision::rejected(
                        RejectionCode::ValidationError,
                        format!("status write failed: {err}"),
                    );
                }
            };
            if !written.applied {
                // 巡检路径抢先更新了版本，重读后重算
                continue;
            }

            self.post_apply(device, &before, &written.record, action, origin, actor, now_ms)
                .await;
            return CommandDecision::Accepted {
                new_status: written.record.status,
            };
        }

        CommandDecision::rejected(
            RejectionCode::ValidationError,
            "status write contention, giving up",
        )
    }

    /// 落盘后的旁路动作：能耗结算、运行时长评估、事件记录。
    /// 任何失败都不影响已生效的状态变更。
    #[allow(clippy::too_many_arguments)]
    async fn post_apply(
        &self,
        device: &DeviceRecord,
        before: &LiveStatusRecord,
        after: &LiveStatusRecord,
        action: CommandAction,
        origin: EventOrigin,
        actor: &str,
        now_ms: i64,
    ) {
        if after.status == DeviceStatus::Off {
            if let Some(on_since_ms) = before.on_since_ms {
                match self.energy.accrue_off(device, on_since_ms, now_ms).await {
                    Ok(Some(_)) => bms_telemetry::record_energy_accrual(),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(
                            target: "bms_control",
                            device_id = %device.device_id,
                            error = %err,
                            "energy accrual failed"
                        );
                    }
                }
            }
        } else if let Err(err) = self.runtime.evaluate(&device.device_id).await {
            tracing::warn!(
                target: "bms_control",
                device_id = %device.device_id,
                error = %err,
                "post-apply runtime evaluation failed"
            );
        }

        let event = DeviceEventRecord {
            event_id: Uuid::new_v4().to_string(),
            device_id: device.device_id.clone(),
            action: DeviceEventRecord::action_for(action),
            resulting_status: after.status,
            origin,
            actor: actor.to_string(),
            ts_ms: now_ms,
        };
        // 追加失败重试一次，再失败只告警
        if self.event_store.append_event(event.clone()).await.is_err() {
            if let Err(err) = self.event_store.append_event(event).await {
                bms_telemetry::record_event_append_failure();
                tracing::warn!(
                    target: "bms_control",
                    device_id = %device.device_id,
                    error = %err,
                    "event append failed after retry"
                );
            }
        }
    }

    /// 解析设备所在楼宇的自动化模式；未认领或引用断裂视为无模式。
    async fn building_mode(&self, device: &DeviceRecord) -> Result<AutomationMode, String> {
        let Some(location_id) = device.location_id.as_deref() else {
            return Ok(AutomationMode::None);
        };
        let location = self
            .location_store
            .find_location(location_id)
            .await
            .map_err(|err| format!("location lookup failed: {err}"))?;
        let Some(location) = location else {
            return Ok(AutomationMode::None);
        };
        let state = self
            .automation_store
            .get_state(&location.building_id)
            .await
            .map_err(|err| format!("automation state lookup failed: {err}"))?;
        Ok(state.map(|record| record.mode).unwrap_or(AutomationMode::None))
    }

    fn lock_for(&self, device_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = match self.device_locks.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        // 回收无持有者的条目，设备增删不会让映射无限增长
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        map.entry(device_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// 当前时间戳（毫秒）。
fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bms_runtime::{NoopDispatcher, RuntimePolicy, RuntimeTracker};
    use bms_storage::{
        InMemoryAutomationStateStore, InMemoryBuildingStore, InMemoryDeviceEventStore,
        InMemoryDeviceStore, InMemoryEnergyUsageStore, InMemoryLiveStatusStore,
        InMemoryLocationStore, InMemoryRoleStore, InMemoryUserStore,
    };

    fn build_gate() -> CommandGate {
        let users = Arc::new(InMemoryUserStore::new());
        let roles = Arc::new(InMemoryRoleStore::new());
        let locations = Arc::new(InMemoryLocationStore::new());
        let buildings = Arc::new(InMemoryBuildingStore::new());
        let devices = Arc::new(InMemoryDeviceStore::new());
        let statuses = Arc::new(InMemoryLiveStatusStore::new());

        let resolver = Arc::new(RoleResolver::new(
            users,
            roles,
            locations.clone(),
            buildings.clone(),
        ));
        let runtime = Arc::new(RuntimeTracker::new(
            devices.clone(),
            statuses.clone(),
            locations.clone(),
            buildings,
            Arc::new(NoopDispatcher),
            RuntimePolicy::default(),
        ));
        let energy = Arc::new(EnergyMeter::new(Arc::new(InMemoryEnergyUsageStore::new())));
        CommandGate::new(
            resolver,
            devices,
            statuses,
            locations,
            Arc::new(InMemoryAutomationStateStore::new()),
            Arc::new(InMemoryDeviceEventStore::new()),
            runtime,
            energy,
            Duration::from_millis(2000),
        )
    }

    /// 无持有者的设备锁条目会在下次取锁时回收，映射不随设备增删累积。
    #[tokio::test]
    async fn device_lock_entries_are_reclaimed() {
        let gate = build_gate();
        for index in 0..64 {
            let lock = gate.lock_for(&format!("d{index}"));
            drop(lock);
        }

        let held = gate.lock_for("d-held");
        let other = gate.lock_for("d-other");
        let len = match gate.device_locks.lock() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        // 只剩仍被持有的两把锁，之前 64 个条目已回收
        assert_eq!(len, 2);
        drop(held);
        drop(other);

        let _ = gate.lock_for("d-next");
        let len = match gate.device_locks.lock() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        assert_eq!(len, 1);
    }
}
