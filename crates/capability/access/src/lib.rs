//! 访问控制能力：角色解析与设备可见性。
//!
//! 核心规则：
//! - 系统管理员不受楼宇角色限制
//! - 未认领设备（无位置引用）仅系统管理员可见
//! - parent 角色覆盖整栋楼宇，children 角色限于被指派的位置
//! - 任何查找失败按拒绝处理（fail closed），绝不默认放行

use bms_storage::{
    BuildingStore, DeviceRecord, LocationStore, RoleStore, StorageError, UserBuildingRoleRecord,
    UserStore,
};
use domain::{BuildingRole, UserContext};
use std::sync::Arc;

/// 访问控制错误。存储失败必须向上传播，调用方据此拒绝请求。
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for AccessError {
    fn from(err: StorageError) -> Self {
        AccessError::Storage(err.to_string())
    }
}

/// 角色解析器。
///
/// 持有目录相关存储的引用，按 (user, building) 解析角色，
/// 并在设备维度回答可见/可控/可管理三类问题。
pub struct RoleResolver {
    user_store: Arc<dyn UserStore>,
    role_store: Arc<dyn RoleStore>,
    location_store: Arc<dyn LocationStore>,
    building_store: Arc<dyn BuildingStore>,
}

impl RoleResolver {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        role_store: Arc<dyn RoleStore>,
        location_store: Arc<dyn LocationStore>,
        building_store: Arc<dyn BuildingStore>,
    ) -> Self {
        Self {
            user_store,
            role_store,
            location_store,
            building_store,
        }
    }

    /// 查询用户是否为系统管理员（以存储中的当前值为准）。
    pub async fn is_system_administrator(&self, user_id: &str) -> Result<bool, AccessError> {
        let user = self.user_store.find_user(user_id).await?;
        Ok(user.map(|item| item.is_system_administrator).unwrap_or(false))
    }

    /// 解析用户在指定楼宇的角色；无记录等价于 role = none。
    pub async fn role_in_building(
        &self,
        user_id: &str,
        building_id: &str,
    ) -> Result<UserBuildingRoleRecord, AccessError> {
        let record = self.role_store.find_role(user_id, building_id).await?;
        Ok(record.unwrap_or_else(|| UserBuildingRoleRecord::none(user_id, building_id)))
    }

    /// 设备是否对用户可见。
    ///
    /// 管理员恒可见；未认领设备对非管理员不可见；
    /// 位置或楼宇引用解析失败按不可见处理。
    pub async fn can_view(
        &self,
        user: &UserContext,
        device: &DeviceRecord,
    ) -> Result<bool, AccessError> {
        if user.is_system_administrator {
            return Ok(true);
        }
        let Some(location_id) = device.location_id.as_deref() else {
            return Ok(false);
        };
        let Some(location) = self.location_store.find_location(location_id).await? else {
            tracing::warn!(
                target: "bms_access",
                device_id = %device.device_id,
                location_id = %location_id,
                "device location unresolvable, denying access"
            );
            return Ok(false);
        };
        let building = self
            .building_store
            .find_building(&location.building_id)
            .await?;
        if building.is_none() {
            tracing::warn!(
                target: "bms_access",
                device_id = %device.device_id,
                building_id = %location.building_id,
                "location building unresolvable, denying access"
            );
            return Ok(false);
        }

        let role = self
            .role_in_building(&user.user_id, &location.building_id)
            .await?;
        match role.role {
            BuildingRole::Parent => Ok(true),
            BuildingRole::Children => {
                // 旧版直挂用户回退通道
                if device.assigned_to.iter().any(|id| id == &user.user_id) {
                    return Ok(true);
                }
                Ok(role
                    .assigned_locations
                    .iter()
                    .any(|id| id == &location.location_id))
            }
            BuildingRole::None => Ok(false),
        }
    }

    /// 设备是否对用户可控。
    ///
    /// 当前与 `can_view` 同策略；独立入口保证未来收紧时不改调用方。
    pub async fn can_control(
        &self,
        user: &UserContext,
        device: &DeviceRecord,
    ) -> Result<bool, AccessError> {
        self.can_view(user, device).await
    }

    /// 用户是否具备管理能力（创建/认领/删除设备）。
    ///
    /// 管理员恒可管理；否则要求在至少一栋楼宇持有 parent 角色。
    pub async fn can_manage(&self, user: &UserContext) -> Result<bool, AccessError> {
        if user.is_system_administrator {
            return Ok(true);
        }
        let roles = self.role_store.list_roles_for_user(&user.user_id).await?;
        Ok(roles
            .iter()
            .any(|record| record.role == BuildingRole::Parent))
    }

    /// 过滤出用户可见的设备子集。
    ///
    /// 单个设备的查找失败只影响该设备（按不可见处理），不中断整个列表。
    pub async fn resolve_visible_devices(
        &self,
        user: &UserContext,
        devices: Vec<DeviceRecord>,
    ) -> Vec<DeviceRecord> {
        let mut visible = Vec::new();
        for device in devices {
            match self.can_view(user, &device).await {
                Ok(true) => visible.push(device),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        target: "bms_access",
                        device_id = %device.device_id,
                        error = %err,
                        "visibility check failed, omitting device"
                    );
                }
            }
        }
        visible
    }
}
