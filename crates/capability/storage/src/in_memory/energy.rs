//! 按日能耗内存存储实现
//!
//! 键为 (device_id, date)，累加写入，保留 6 位小数。

use crate::error::StorageError;
use crate::models::EnergyDailyRecord;
use crate::traits::EnergyUsageStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 按日能耗内存存储
pub struct InMemoryEnergyUsageStore {
    usage: RwLock<HashMap<(String, String), EnergyDailyRecord>>,
}

impl InMemoryEnergyUsageStore {
    pub fn new() -> Self {
        Self {
            usage: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEnergyUsageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EnergyUsageStore for InMemoryEnergyUsageStore {
    async fn add_usage(
        &self,
        device_id: &str,
        date: &str,
        kwh: f64,
        wattage_w: i64,
        now_ms: i64,
    ) -> Result<EnergyDailyRecord, StorageError> {
        let mut map = self
            .usage
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let key = (device_id.to_string(), date.to_string());
        let record = map
            .entry(key)
            .and_modify(|item| {
                item.usage_kwh = round6(item.usage_kwh + kwh);
                item.device_wattage_w = wattage_w;
                item.last_updated_ms = now_ms;
            })
            .or_insert_with(|| EnergyDailyRecord {
                device_id: device_id.to_string(),
                date: date.to_string(),
                usage_kwh: round6(kwh),
                device_wattage_w: wattage_w,
                last_updated_ms: now_ms,
            });
        Ok(record.clone())
    }

    async fn get_daily(
        &self,
        device_id: &str,
        date: &str,
    ) -> Result<Option<EnergyDailyRecord>, StorageError> {
        let key = (device_id.to_string(), date.to_string());
        let map = self
            .usage
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(&key).cloned())
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
