//! 设备内存存储实现
//!
//! 功能：
//! - 设备创建 / 查找 / 列表 / 删除
//! - 认领、迁移与取消认领（位置引用变更）

use crate::error::StorageError;
use crate::models::DeviceRecord;
use crate::traits::DeviceStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 设备内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, StorageError> {
        let map = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<DeviceRecord> = map.values().cloned().collect();
        items.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(items)
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        let map = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(device_id).cloned())
    }

    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.device_id) {
            return Err(StorageError::new("device exists"));
        }
        map.insert(record.device_id.clone(), record.clone());
        Ok(record)
    }

    async fn set_location(
        &self,
        device_id: &str,
        location_id: Option<&str>,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.get_mut(device_id) {
            Some(record) => {
                record.location_id = location_id.map(|value| value.to_string());
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(device_id).is_some())
    }
}
