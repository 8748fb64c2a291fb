//! 用户内存存储实现

use crate::error::StorageError;
use crate::models::UserRecord;
use crate::traits::UserStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// 用户内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    /// 创建空的用户存储
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// 创建带默认系统管理员的用户存储（本地启动用）。
    ///
    /// `password_hash` 由调用方提供，存储层不做哈希。
    pub fn with_default_admin(password_hash: impl Into<String>) -> Self {
        let store = Self::new();
        let record = UserRecord {
            user_id: "user-admin".to_string(),
            email: "admin@local".to_string(),
            password_hash: password_hash.into(),
            display_name: "Administrator".to_string(),
            is_system_administrator: true,
            refresh_jti: None,
        };
        if let Ok(mut map) = store.users.write() {
            map.insert(record.user_id.clone(), record);
        }
        store
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let map = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.values().find(|item| item.email == email).cloned())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError> {
        let map = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(user_id).cloned())
    }

    async fn create_user(&self, record: UserRecord) -> Result<UserRecord, StorageError> {
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if map.contains_key(&record.user_id) {
            return Err(StorageError::new("user exists"));
        }
        if map.values().any(|item| item.email == record.email) {
            return Err(StorageError::new("email exists"));
        }
        map.insert(record.user_id.clone(), record.clone());
        Ok(record)
    }

    async fn set_refresh_jti(
        &self,
        user_id: &str,
        jti: Option<&str>,
    ) -> Result<bool, StorageError> {
        let mut map = self
            .users
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        match map.get_mut(user_id) {
            Some(record) => {
                record.refresh_jti = jti.map(|value| value.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_refresh_jti(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        let map = self
            .users
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(user_id).and_then(|item| item.refresh_jti.clone()))
    }
}
