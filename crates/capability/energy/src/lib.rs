//! 能耗累计能力：按开机时长与额定功率折算 kWh，按日累计。
//!
//! 只在设备转为 Off 时结算一次会话能耗；计费/电价不在范围内。

use bms_storage::{DeviceRecord, EnergyDailyRecord, EnergyUsageStore, StorageError};
use chrono::{TimeZone, Utc};
use std::sync::Arc;

/// 能耗相关错误。
#[derive(Debug, thiserror::Error)]
pub enum EnergyError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for EnergyError {
    fn from(err: StorageError) -> Self {
        EnergyError::Storage(err.to_string())
    }
}

/// 时长 + 功率折算 kWh，保留 6 位小数。
pub fn kwh(duration_minutes: f64, wattage_w: i64) -> f64 {
    let raw = (wattage_w as f64 / 1000.0) * (duration_minutes / 60.0);
    (raw * 1_000_000.0).round() / 1_000_000.0
}

/// 毫秒时间戳对应的 UTC 日期键（YYYY-MM-DD）。
pub fn date_key(ts_ms: i64) -> String {
    Utc.timestamp_millis_opt(ts_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

/// 能耗结算器。
pub struct EnergyMeter {
    usage_store: Arc<dyn EnergyUsageStore>,
}

impl EnergyMeter {
    pub fn new(usage_store: Arc<dyn EnergyUsageStore>) -> Self {
        Self { usage_store }
    }

    /// 设备关机时结算本次开机会话的能耗，累加到当日记录。
    ///
    /// 时长非正（时钟回拨等）按零处理，不产生记录。
    pub async fn accrue_off(
        &self,
        device: &DeviceRecord,
        on_since_ms: i64,
        now_ms: i64,
    ) -> Result<Option<EnergyDailyRecord>, EnergyError> {
        let duration_minutes = (now_ms - on_since_ms) as f64 / 60_000.0;
        if duration_minutes <= 0.0 || device.wattage_w <= 0 {
            return Ok(None);
        }
        let session_kwh = kwh(duration_minutes, device.wattage_w);
        let date = date_key(now_ms);
        let record = self
            .usage_store
            .add_usage(&device.device_id, &date, session_kwh, device.wattage_w, now_ms)
            .await?;
        tracing::debug!(
            target: "bms_energy",
            device_id = %device.device_id,
            date = %date,
            session_kwh,
            total_kwh = record.usage_kwh,
            "energy session accrued"
        );
        Ok(Some(record))
    }
}
