//! 楼宇内存存储实现

use crate::error::StorageError;
use crate::models::BuildingRecord;
use crate::traits::BuildingStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 楼宇内存存储
pub struct InMemoryBuildingStore {
    buildings: RwLock<HashMap<String, BuildingRecord>>,
}

impl InMemoryBuildingStore {
    pub fn new() -> Self {
        Self {
            buildings: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBuildingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BuildingStore for InMemoryBuildingStore {
    async fn list_buildings(&self) -> Result<Vec<BuildingRecord>, StorageError> {
        let map = self
            .buildings
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<BuildingRecord> = map.values().cloned().collect();
        items.sort_by(|a, b| a.building_id.cmp(&b.building_id));
        Ok(items)
    }

    async fn find_building(
        &self,
        building_id: &str,
    ) -> Result<Option<BuildingRecord>, StorageError> {
        let map = self
            .buildings
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(building_id).cloned())
    }

    async fn create_building(
        &self,
        record: BuildingRecord,
    ) -> Result<BuildingRecord, StorageError> {
        let mut map = self
            .buildings
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.building_id) {
            return Err(StorageError::new("building exists"));
        }
        map.insert(record.building_id.clone(), record.clone());
        Ok(record)
    }
}
