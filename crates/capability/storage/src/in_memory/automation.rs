//! 楼宇自动化状态内存存储实现
//!
//! 每栋楼宇一条记录，整条覆盖写入。模式互斥由单记录结构保证：
//! 写入新模式即替换旧模式，不存在两个模式同时为真的状态。

use crate::error::StorageError;
use crate::models::AutomationStateRecord;
use crate::traits::AutomationStateStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 楼宇自动化状态内存存储
pub struct InMemoryAutomationStateStore {
    states: RwLock<HashMap<String, AutomationStateRecord>>,
}

impl InMemoryAutomationStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAutomationStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AutomationStateStore for InMemoryAutomationStateStore {
    async fn get_state(
        &self,
        building_id: &str,
    ) -> Result<Option<AutomationStateRecord>, StorageError> {
        let map = self
            .states
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(building_id).cloned())
    }

    async fn put_state(
        &self,
        record: AutomationStateRecord,
    ) -> Result<AutomationStateRecord, StorageError> {
        let mut map = self
            .states
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(record.building_id.clone(), record.clone());
        Ok(record)
    }
}
