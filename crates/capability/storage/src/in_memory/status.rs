//! 设备实时状态内存存储实现
//!
//! 写入采用版本化比较交换：期望版本与存储中版本不符时拒绝写入并
//! 返回当前记录，由调用方决定重试或放弃。命令授权门与运行时长
//! 巡检共享该存储，版本校验保证两路写入不会互相覆盖。

use crate::error::StorageError;
use crate::models::{LiveStatusRecord, StatusWriteResult};
use crate::traits::LiveStatusStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 设备实时状态内存存储
pub struct InMemoryLiveStatusStore {
    statuses: RwLock<HashMap<String, LiveStatusRecord>>,
}

impl InMemoryLiveStatusStore {
    pub fn new() -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLiveStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LiveStatusStore for InMemoryLiveStatusStore {
    async fn get_status(
        &self,
        device_id: &str,
    ) -> Result<Option<LiveStatusRecord>, StorageError> {
        let map = self
            .statuses
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(device_id).cloned())
    }

    async fn put_status(
        &self,
        mut record: LiveStatusRecord,
        expected_version: Option<u64>,
    ) -> Result<StatusWriteResult, StorageError> {
        let mut map = self
            .statuses
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let current_version = map.get(&record.device_id).map(|item| item.version);
        if current_version != expected_version {
            // 版本冲突：返回存储中的当前值（冲突时必然存在记录）
            let current = map
                .get(&record.device_id)
                .cloned()
                .unwrap_or_else(|| LiveStatusRecord::initial(record.device_id.clone()));
            return Ok(StatusWriteResult {
                record: current,
                applied: false,
            });
        }
        record.version = expected_version.map(|v| v + 1).unwrap_or(1);
        map.insert(record.device_id.clone(), record.clone());
        Ok(StatusWriteResult {
            record,
            applied: true,
        })
    }

    async fn delete_status(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .statuses
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(device_id).is_some())
    }
}
