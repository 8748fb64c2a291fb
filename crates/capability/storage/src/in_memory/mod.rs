//! 内存存储实现模块
//!
//! 运行时默认后端，亦用于测试。
//!
//! 包含以下实现：
//! - UserStore: InMemoryUserStore
//! - BuildingStore: InMemoryBuildingStore
//! - LocationStore: InMemoryLocationStore
//! - RoleStore: InMemoryRoleStore
//! - DeviceStore: InMemoryDeviceStore
//! - LiveStatusStore: InMemoryLiveStatusStore
//! - AutomationStateStore: InMemoryAutomationStateStore
//! - DeviceEventStore: InMemoryDeviceEventStore
//! - AutomationRuleStore: InMemoryAutomationRuleStore
//! - EnergyUsageStore: InMemoryEnergyUsageStore

pub mod automation;
pub mod building;
pub mod device;
pub mod energy;
pub mod event;
pub mod location;
pub mod role;
pub mod rule;
pub mod status;
pub mod user;

pub use automation::*;
pub use building::*;
pub use device::*;
pub use energy::*;
pub use event::*;
pub use location::*;
pub use role::*;
pub use rule::*;
pub use status::*;
pub use user::*;
