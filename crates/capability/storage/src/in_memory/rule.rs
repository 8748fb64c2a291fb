//! 设备级自动化规则内存存储实现

use crate::error::StorageError;
use crate::models::AutomationRuleRecord;
use crate::traits::AutomationRuleStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 自动化规则内存存储
///
/// 每台设备至多一条规则，覆盖写入。
pub struct InMemoryAutomationRuleStore {
    rules: RwLock<HashMap<String, AutomationRuleRecord>>,
}

impl InMemoryAutomationRuleStore {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAutomationRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AutomationRuleStore for InMemoryAutomationRuleStore {
    async fn put_rule(
        &self,
        record: AutomationRuleRecord,
    ) -> Result<AutomationRuleRecord, StorageError> {
        let mut map = self
            .rules
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(record.device_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_rule(
        &self,
        device_id: &str,
    ) -> Result<Option<AutomationRuleRecord>, StorageError> {
        let map = self
            .rules
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(device_id).cloned())
    }

    async fn list_rules(&self) -> Result<Vec<AutomationRuleRecord>, StorageError> {
        let map = self
            .rules
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<AutomationRuleRecord> = map.values().cloned().collect();
        items.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(items)
    }

    async fn delete_rules_for_device(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .rules
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(device_id).is_some())
    }
}
