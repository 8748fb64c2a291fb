//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - UserStore：用户存储（目录的身份部分）
//! - BuildingStore / LocationStore：楼宇层级存储
//! - RoleStore：用户-楼宇角色存储（目录的授权部分）
//! - DeviceStore：设备持久属性存储（注册表）
//! - LiveStatusStore：设备实时状态存储（版本化比较交换写入）
//! - AutomationStateStore：楼宇自动化状态存储
//! - DeviceEventStore：设备事件存储（只追加）
//! - AutomationRuleStore：设备级自动化规则存储
//! - EnergyUsageStore：按日能耗存储
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发
//! - 查找缺失返回 `Ok(None)`，调用方决定是否按失败处理

use crate::error::StorageError;
use crate::models::{
    AutomationRuleRecord, AutomationStateRecord, BuildingRecord, DeviceEventRecord, DeviceRecord,
    EnergyDailyRecord, LiveStatusRecord, LocationRecord, StatusWriteResult, UserBuildingRoleRecord,
    UserRecord,
};
use async_trait::async_trait;

/// 用户存储接口。
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 根据邮箱查找用户（登录入口）。
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 根据用户 ID 查找用户。
    async fn find_user(&self, user_id: &str) -> Result<Option<UserRecord>, StorageError>;

    /// 创建用户。
    async fn create_user(&self, record: UserRecord) -> Result<UserRecord, StorageError>;

    /// 绑定/清除 refresh token 的 jti（登录与轮换时调用）。
    async fn set_refresh_jti(
        &self,
        user_id: &str,
        jti: Option<&str>,
    ) -> Result<bool, StorageError>;

    /// 读取当前绑定的 refresh jti。
    async fn get_refresh_jti(&self, user_id: &str) -> Result<Option<String>, StorageError>;
}

/// 楼宇存储接口。
#[async_trait]
pub trait BuildingStore: Send + Sync {
    async fn list_buildings(&self) -> Result<Vec<BuildingRecord>, StorageError>;

    async fn find_building(
        &self,
        building_id: &str,
    ) -> Result<Option<BuildingRecord>, StorageError>;

    async fn create_building(&self, record: BuildingRecord)
        -> Result<BuildingRecord, StorageError>;
}

/// 位置存储接口。
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// 列出指定楼宇下的所有位置。
    async fn list_locations(&self, building_id: &str)
        -> Result<Vec<LocationRecord>, StorageError>;

    async fn find_location(
        &self,
        location_id: &str,
    ) -> Result<Option<LocationRecord>, StorageError>;

    /// 创建位置。楼宇引用必须已存在，由实现校验。
    async fn create_location(&self, record: LocationRecord)
        -> Result<LocationRecord, StorageError>;
}

/// 用户-楼宇角色存储接口。
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// 查找 (user, building) 的角色记录；缺失返回 `Ok(None)`（等价 role = none）。
    async fn find_role(
        &self,
        user_id: &str,
        building_id: &str,
    ) -> Result<Option<UserBuildingRoleRecord>, StorageError>;

    /// 列出用户在所有楼宇的角色记录。
    async fn list_roles_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserBuildingRoleRecord>, StorageError>;

    /// 写入角色记录（同一 (user, building) 覆盖旧值，保证至多一条）。
    async fn put_role(
        &self,
        record: UserBuildingRoleRecord,
    ) -> Result<UserBuildingRoleRecord, StorageError>;
}

/// 设备持久属性存储接口（注册表）。
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, StorageError>;

    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError>;

    /// 创建设备（初始未认领）。
    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError>;

    /// 认领/迁移/取消认领：设置或清空位置引用。
    async fn set_location(
        &self,
        device_id: &str,
        location_id: Option<&str>,
    ) -> Result<Option<DeviceRecord>, StorageError>;

    /// 删除设备。事件历史不随设备删除。
    async fn delete_device(&self, device_id: &str) -> Result<bool, StorageError>;
}

/// 设备实时状态存储接口。
///
/// 写入为版本化比较交换：`expected_version = None` 表示期望尚无记录。
/// 版本不匹配时返回 `applied = false` 与存储中的当前记录，调用方自行重试或放弃。
#[async_trait]
pub trait LiveStatusStore: Send + Sync {
    async fn get_status(&self, device_id: &str)
        -> Result<Option<LiveStatusRecord>, StorageError>;

    async fn put_status(
        &self,
        record: LiveStatusRecord,
        expected_version: Option<u64>,
    ) -> Result<StatusWriteResult, StorageError>;

    /// 设备删除时清除实时状态。
    async fn delete_status(&self, device_id: &str) -> Result<bool, StorageError>;
}

/// 楼宇自动化状态存储接口。
#[async_trait]
pub trait AutomationStateStore: Send + Sync {
    /// 读取楼宇自动化状态；无记录返回 `Ok(None)`，调用方使用隐式默认（none）。
    async fn get_state(
        &self,
        building_id: &str,
    ) -> Result<Option<AutomationStateRecord>, StorageError>;

    /// 写入楼宇自动化状态（整条覆盖，单记录结构保证模式互斥）。
    async fn put_state(
        &self,
        record: AutomationStateRecord,
    ) -> Result<AutomationStateRecord, StorageError>;
}

/// 设备事件存储接口（只追加）。
#[async_trait]
pub trait DeviceEventStore: Send + Sync {
    async fn append_event(
        &self,
        record: DeviceEventRecord,
    ) -> Result<DeviceEventRecord, StorageError>;

    /// 按时间倒序列出设备事件。`limit <= 0` 表示不限制。
    async fn list_events(
        &self,
        device_id: &str,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
        limit: i64,
    ) -> Result<Vec<DeviceEventRecord>, StorageError>;
}

/// 设备级自动化规则存储接口。
#[async_trait]
pub trait AutomationRuleStore: Send + Sync {
    async fn put_rule(
        &self,
        record: AutomationRuleRecord,
    ) -> Result<AutomationRuleRecord, StorageError>;

    async fn find_rule(
        &self,
        device_id: &str,
    ) -> Result<Option<AutomationRuleRecord>, StorageError>;

    async fn list_rules(&self) -> Result<Vec<AutomationRuleRecord>, StorageError>;

    /// 设备删除时清理其规则。
    async fn delete_rules_for_device(&self, device_id: &str) -> Result<bool, StorageError>;
}

/// 按日能耗存储接口。
#[async_trait]
pub trait EnergyUsageStore: Send + Sync {
    /// 向指定日期累加能耗（文档不存在则创建）。
    async fn add_usage(
        &self,
        device_id: &str,
        date: &str,
        kwh: f64,
        wattage_w: i64,
        now_ms: i64,
    ) -> Result<EnergyDailyRecord, StorageError>;

    async fn get_daily(
        &self,
        device_id: &str,
        date: &str,
    ) -> Result<Option<EnergyDailyRecord>, StorageError>;
}
