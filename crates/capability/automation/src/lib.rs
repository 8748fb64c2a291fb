//! 楼宇自动化能力：模式切换、启用时的批量动作、统计报表。
//!
//! 模式语义：
//! - 每栋楼宇单条状态记录，天然保证模式互斥
//! - 只有 lockdown 对后续命令有拦截效果（由授权门执行）
//! - eco/night 仅在启用瞬间按设备类型批量关断一次，无持续限制
//! - 重复设置当前模式是幂等操作，但仍刷新修改元数据

pub mod rules;

use bms_control::CommandGate;
use bms_storage::{
    AutomationStateRecord, AutomationStateStore, BuildingStore, DeviceRecord, DeviceStore,
    LiveStatusStore, LocationStore, StorageError,
};
use domain::{AutomationMode, CommandAction, DeviceStatus, EventOrigin};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// 自动化能力错误。
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("building not found: {0}")]
    BuildingNotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for AutomationError {
    fn from(err: StorageError) -> Self {
        AutomationError::Storage(err.to_string())
    }
}

/// 启用 eco/night 时按设备类型关断的清单。
#[derive(Debug, Clone)]
pub struct ShedConfig {
    pub eco_types: Vec<String>,
    pub night_types: Vec<String>,
}

impl Default for ShedConfig {
    fn default() -> Self {
        Self {
            eco_types: vec!["AC".to_string()],
            night_types: vec!["Fan".to_string(), "AC".to_string()],
        }
    }
}

/// 楼宇自动化统计。
#[derive(Debug, Clone)]
pub struct AutomationStatistics {
    pub building_id: String,
    pub total_devices: u64,
    pub devices_on: u64,
    pub devices_off: u64,
    pub mode: AutomationMode,
    pub mode_title: String,
    pub modified_by: String,
    pub modified_at_ms: i64,
}

/// 自动化服务。
pub struct AutomationService {
    state_store: Arc<dyn AutomationStateStore>,
    building_store: Arc<dyn BuildingStore>,
    device_store: Arc<dyn DeviceStore>,
    status_store: Arc<dyn LiveStatusStore>,
    location_store: Arc<dyn LocationStore>,
    gate: Arc<CommandGate>,
    shed: ShedConfig,
}

impl AutomationService {
    pub fn new(
        state_store: Arc<dyn AutomationStateStore>,
        building_store: Arc<dyn BuildingStore>,
        device_store: Arc<dyn DeviceStore>,
        status_store: Arc<dyn LiveStatusStore>,
        location_store: Arc<dyn LocationStore>,
        gate: Arc<CommandGate>,
        shed: ShedConfig,
    ) -> Self {
        Self {
            state_store,
            building_store,
            device_store,
            status_store,
            location_store,
            gate,
            shed,
        }
    }

    /// 切换楼宇自动化模式。
    ///
    /// 写入新状态后执行该模式的一次性批量动作。设置 none 等价清除。
    pub async fn set_mode(
        &self,
        building_id: &str,
        mode: AutomationMode,
        actor: &str,
    ) -> Result<AutomationStateRecord, AutomationError> {
        if self.building_store.find_building(building_id).await?.is_none() {
            return Err(AutomationError::BuildingNotFound(building_id.to_string()));
        }

        let record = self
            .state_store
            .put_state(AutomationStateRecord {
                building_id: building_id.to_string(),
                mode,
                modified_by: actor.to_string(),
                modified_at_ms: now_epoch_ms(),
            })
            .await?;
        bms_telemetry::record_automation_mode_change();
        tracing::info!(
            target: "bms_automation",
            building_id = %building_id,
            mode = mode.as_str(),
            actor = %actor,
            "automation mode set"
        );

        match mode {
            AutomationMode::Lockdown => {
                self.shed_devices(building_id, actor, None).await?;
            }
            AutomationMode::Eco => {
                self.shed_devices(building_id, actor, Some(&self.shed.eco_types))
                    .await?;
            }
            AutomationMode::Night => {
                self.shed_devices(building_id, actor, Some(&self.shed.night_types))
                    .await?;
            }
            AutomationMode::None => {}
        }
        Ok(record)
    }

    /// 清除自动化模式（回到 none）。
    pub async fn clear_mode(
        &self,
        building_id: &str,
        actor: &str,
    ) -> Result<AutomationStateRecord, AutomationError> {
        self.set_mode(building_id, AutomationMode::None, actor).await
    }

    /// 读取楼宇自动化状态；无记录返回隐式默认（none）。
    pub async fn get_mode(
        &self,
        building_id: &str,
    ) -> Result<AutomationStateRecord, AutomationError> {
        let state = self.state_store.get_state(building_id).await?;
        Ok(state.unwrap_or_else(|| AutomationStateRecord::default_for(building_id)))
    }

    /// 楼宇统计报表。只读，不参与任何命令判定。
    pub async fn statistics(
        &self,
        building_id: &str,
    ) -> Result<AutomationStatistics, AutomationError> {
        if self.building_store.find_building(building_id).await?.is_none() {
            return Err(AutomationError::BuildingNotFound(building_id.to_string()));
        }
        let state = self.get_mode(building_id).await?;
        let devices = self.devices_in_building(building_id).await?;

        let mut devices_on = 0u64;
        for device in &devices {
            let status = self.status_store.get_status(&device.device_id).await?;
            if status.map(|record| record.status == DeviceStatus::On).unwrap_or(false) {
                devices_on += 1;
            }
        }
        let total_devices = devices.len() as u64;
        Ok(AutomationStatistics {
            building_id: building_id.to_string(),
            total_devices,
            devices_on,
            devices_off: total_devices - devices_on,
            mode: state.mode,
            mode_title: state.mode.title().to_string(),
            modified_by: state.modified_by,
            modified_at_ms: state.modified_at_ms,
        })
    }

    /// 批量关断楼宇内设备。`types = None` 表示全部设备（lockdown）。
    ///
    /// 单台设备的失败只记日志，不中断批量动作。
    async fn shed_devices(
        &self,
        building_id: &str,
        actor: &str,
        types: Option<&Vec<String>>,
    ) -> Result<(), AutomationError> {
        let devices = self.devices_in_building(building_id).await?;
        for device in devices {
            if let Some(types) = types {
                let matched = types
                    .iter()
                    .any(|value| value.eq_ignore_ascii_case(&device.device_type));
                if !matched {
                    continue;
                }
            }
            let decision = self
                .gate
                .apply_system_command(
                    actor,
                    &device.device_id,
                    CommandAction::TurnOff,
                    EventOrigin::Automation,
                )
                .await;
            if decision.is_accepted() {
                bms_telemetry::record_bulk_shed_action();
            } else {
                tracing::warn!(
                    target: "bms_automation",
                    building_id = %building_id,
                    device_id = %device.device_id,
                    "bulk shed command rejected"
                );
            }
        }
        Ok(())
    }

    /// 列出位置引用解析到指定楼宇的已认领设备。
    async fn devices_in_building(
        &self,
        building_id: &str,
    ) -> Result<Vec<DeviceRecord>, AutomationError> {
        let mut matched = Vec::new();
        for device in self.device_store.list_devices().await? {
            let Some(location_id) = device.location_id.as_deref() else {
                continue;
            };
            let Some(location) = self.location_store.find_location(location_id).await? else {
                continue;
            };
            if location.building_id == building_id {
                matched.push(device);
            }
        }
        Ok(matched)
    }
}

/// 当前时间戳（毫秒）。
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or_default()
}
