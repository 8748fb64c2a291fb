//! 用户-楼宇角色内存存储实现

use crate::error::StorageError;
use crate::models::UserBuildingRoleRecord;
use crate::traits::RoleStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 角色内存存储
///
/// 键为 (user_id, building_id)，天然保证每对至多一条记录。
pub struct InMemoryRoleStore {
    roles: RwLock<HashMap<(String, String), UserBuildingRoleRecord>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn find_role(
        &self,
        user_id: &str,
        building_id: &str,
    ) -> Result<Option<UserBuildingRoleRecord>, StorageError> {
        let key = (user_id.to_string(), building_id.to_string());
        let map = self
            .roles
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(&key).cloned())
    }

    async fn list_roles_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserBuildingRoleRecord>, StorageError> {
        let map = self
            .roles
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<UserBuildingRoleRecord> = map
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.building_id.cmp(&b.building_id));
        Ok(items)
    }

    async fn put_role(
        &self,
        record: UserBuildingRoleRecord,
    ) -> Result<UserBuildingRoleRecord, StorageError> {
        let mut map = self
            .roles
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let key = (record.user_id.clone(), record.building_id.clone());
        map.insert(key, record.clone());
        Ok(record)
    }
}
