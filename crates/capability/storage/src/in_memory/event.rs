//! 设备事件内存存储实现
//!
//! 只追加。记录不随设备删除而清理，审计轨迹长于设备生命周期。

use crate::error::StorageError;
use crate::models::DeviceEventRecord;
use crate::traits::DeviceEventStore;
use std::sync::RwLock;

/// 设备事件内存存储
pub struct InMemoryDeviceEventStore {
    events: RwLock<Vec<DeviceEventRecord>>,
}

impl InMemoryDeviceEventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryDeviceEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceEventStore for InMemoryDeviceEventStore {
    async fn append_event(
        &self,
        record: DeviceEventRecord,
    ) -> Result<DeviceEventRecord, StorageError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        events.push(record.clone());
        Ok(record)
    }

    async fn list_events(
        &self,
        device_id: &str,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        limit: i64,
    ) -> Result<Vec<DeviceEventRecord>, StorageError> {
        let limit = limit.max(0) as usize;
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<DeviceEventRecord> = events
            .iter()
            .filter(|item| item.device_id == device_id)
            .filter(|item| match from_ms {
                Some(from) => item.ts_ms >= from,
                None => true,
            })
            .filter(|item| match to_ms {
                Some(to) => item.ts_ms <= to,
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.ts_ms.cmp(&a.ts_ms));
        if limit > 0 && items.len() > limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}
