//! 位置内存存储实现

use crate::error::StorageError;
use crate::models::LocationRecord;
use crate::traits::LocationStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 位置内存存储
///
/// 楼宇引用的存在性由调用方（创建入口）校验。
pub struct InMemoryLocationStore {
    locations: RwLock<HashMap<String, LocationRecord>>,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self {
            locations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LocationStore for InMemoryLocationStore {
    async fn list_locations(
        &self,
        building_id: &str,
    ) -> Result<Vec<LocationRecord>, StorageError> {
        let map = self
            .locations
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<LocationRecord> = map
            .values()
            .filter(|item| item.building_id == building_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.location_id.cmp(&b.location_id));
        Ok(items)
    }

    async fn find_location(
        &self,
        location_id: &str,
    ) -> Result<Option<LocationRecord>, StorageError> {
        let map = self
            .locations
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(location_id).cloned())
    }

    async fn create_location(
        &self,
        record: LocationRecord,
    ) -> Result<LocationRecord, StorageError> {
        let mut map = self
            .locations
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.location_id) {
            return Err(StorageError::new("location exists"));
        }
        map.insert(record.location_id.clone(), record.clone());
        Ok(record)
    }
}
