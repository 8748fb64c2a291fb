//! 设备级自动化规则：从历史事件推导作息，按小时执行。
//!
//! 推导口径：
//! - 取最近 7 天的设备事件，开/关各至少 2 条才成规则
//! - 开启小时取 ON 事件最常见的小时，关闭小时同理
//! - 生效星期为事件观察到的星期集合，source = "historical"
//!
//! 执行口径：
//! - 只在楼宇模式为 none 时执行；任何激活模式都抑制规则
//! - 当前小时等于 start_hour 发开机，等于 end_hour 发关机

use crate::AutomationError;
use bms_control::CommandGate;
use bms_storage::{
    AutomationRuleRecord, AutomationRuleStore, AutomationStateStore, DeviceEventRecord,
    DeviceEventStore, DeviceStore, LocationStore,
};
use chrono::{Datelike, TimeZone, Timelike, Utc};
use domain::{CommandAction, DeviceStatus, EventOrigin};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// 规则执行路径使用的操作者标识。
pub const RULES_ACTOR: &str = "automation-rules";

/// 推导窗口：最近 7 天。
const DERIVATION_WINDOW_MS: i64 = 7 * 24 * 3_600_000;

/// 成规则所需的最少开/关事件数。
const MIN_EVENTS_EACH: usize = 2;

/// 一轮规则执行的汇总。
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleRunReport {
    pub evaluated: u64,
    pub commands_issued: u64,
}

/// 从历史事件推导并持久化设备规则。
pub struct RulePlanner {
    event_store: Arc<dyn DeviceEventStore>,
    rule_store: Arc<dyn AutomationRuleStore>,
}

impl RulePlanner {
    pub fn new(
        event_store: Arc<dyn DeviceEventStore>,
        rule_store: Arc<dyn AutomationRuleStore>,
    ) -> Self {
        Self {
            event_store,
            rule_store,
        }
    }

    /// 基于给定事件推导规则；样本不足返回 `None`。
    pub fn derive_rule(
        device_id: &str,
        events: &[DeviceEventRecord],
        now_ms: i64,
    ) -> Option<AutomationRuleRecord> {
        let mut on_hours: BTreeMap<u8, u32> = BTreeMap::new();
        let mut off_hours: BTreeMap<u8, u32> = BTreeMap::new();
        let mut days: BTreeSet<String> = BTreeSet::new();
        let mut on_count = 0usize;
        let mut off_count = 0usize;

        for event in events {
            let Some(dt) = Utc.timestamp_millis_opt(event.ts_ms).single() else {
                continue;
            };
            let hour = dt.hour() as u8;
            match event.resulting_status {
                DeviceStatus::On => {
                    *on_hours.entry(hour).or_insert(0) += 1;
                    on_count += 1;
                }
                DeviceStatus::Off => {
                    *off_hours.entry(hour).or_insert(0) += 1;
                    off_count += 1;
                }
            }
            days.insert(dt.format("%A").to_string());
        }

        if on_count < MIN_EVENTS_EACH || off_count < MIN_EVENTS_EACH {
            return None;
        }
        let start_hour = most_common_hour(&on_hours)?;
        let end_hour = most_common_hour(&off_hours)?;

        Some(AutomationRuleRecord {
            device_id: device_id.to_string(),
            start_hour,
            end_hour,
            days: days.into_iter().collect(),
            enabled: true,
            source: "historical".to_string(),
            based_on_events: (on_count + off_count) as u32,
            created_at_ms: now_ms,
            modified_at_ms: now_ms,
        })
    }

    /// 为一批设备推导并持久化规则，返回成规则的数量。
    pub async fn plan_rules(
        &self,
        device_ids: &[String],
        now_ms: i64,
    ) -> Result<u32, AutomationError> {
        let mut planned = 0u32;
        for device_id in device_ids {
            let events = self
                .event_store
                .list_events(
                    device_id,
                    Some(now_ms - DERIVATION_WINDOW_MS),
                    Some(now_ms),
                    0,
                )
                .await?;
            if let Some(rule) = Self::derive_rule(device_id, &events, now_ms) {
                self.rule_store.put_rule(rule).await?;
                planned += 1;
            }
        }
        Ok(planned)
    }
}

/// 执行到点的设备规则。
pub struct RuleExecutor {
    rule_store: Arc<dyn AutomationRuleStore>,
    device_store: Arc<dyn DeviceStore>,
    location_store: Arc<dyn LocationStore>,
    state_store: Arc<dyn AutomationStateStore>,
    gate: Arc<CommandGate>,
}

impl RuleExecutor {
    pub fn new(
        rule_store: Arc<dyn AutomationRuleStore>,
        device_store: Arc<dyn DeviceStore>,
        location_store: Arc<dyn LocationStore>,
        state_store: Arc<dyn AutomationStateStore>,
        gate: Arc<CommandGate>,
    ) -> Self {
        Self {
            rule_store,
            device_store,
            location_store,
            state_store,
            gate,
        }
    }

    /// 执行当前到点的规则。
    pub async fn execute_due_rules(&self) -> Result<RuleRunReport, AutomationError> {
        self.execute_due_rules_at(crate::now_epoch_ms()).await
    }

    /// 执行指定时间点到点的规则（测试可控时钟）。
    pub async fn execute_due_rules_at(
        &self,
        now_ms: i64,
    ) -> Result<RuleRunReport, AutomationError> {
        let Some(now) = Utc.timestamp_millis_opt(now_ms).single() else {
            return Ok(RuleRunReport::default());
        };
        let weekday = now.format("%A").to_string();
        let hour = now.hour() as u8;

        let mut report = RuleRunReport::default();
        for rule in self.rule_store.list_rules().await? {
            if !rule.enabled {
                continue;
            }
            report.evaluated += 1;
            if !rule.days.iter().any(|day| day == &weekday) {
                continue;
            }
            let action = if hour == rule.start_hour {
                CommandAction::TurnOn
            } else if hour == rule.end_hour {
                CommandAction::TurnOff
            } else {
                continue;
            };
            if !self.rule_applicable(&rule.device_id).await? {
                continue;
            }

            let decision = self
                .gate
                .apply_system_command(RULES_ACTOR, &rule.device_id, action, EventOrigin::Automation)
                .await;
            if decision.is_accepted() {
                report.commands_issued += 1;
            } else {
                tracing::warn!(
                    target: "bms_automation",
                    device_id = %rule.device_id,
                    action = action.as_str(),
                    "scheduled rule command rejected"
                );
            }
        }
        Ok(report)
    }

    /// 规则只在设备所在楼宇模式为 none 时生效。
    async fn rule_applicable(&self, device_id: &str) -> Result<bool, AutomationError> {
        let Some(device) = self.device_store.find_device(device_id).await? else {
            return Ok(false);
        };
        let Some(location_id) = device.location_id.as_deref() else {
            return Ok(false);
        };
        let Some(location) = self.location_store.find_location(location_id).await? else {
            return Ok(false);
        };
        let state = self.state_store.get_state(&location.building_id).await?;
        Ok(state.map(|record| !record.enabled()).unwrap_or(true))
    }
}

/// 出现次数最多的小时；并列取更早的小时。
fn most_common_hour(histogram: &BTreeMap<u8, u32>) -> Option<u8> {
    histogram
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(hour, _)| *hour)
}
