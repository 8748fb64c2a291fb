//! 应用共享状态。

use bms_access::RoleResolver;
use bms_auth::AuthService;
use bms_automation::AutomationService;
use bms_automation::rules::RulePlanner;
use bms_control::CommandGate;
use bms_runtime::RuntimeTracker;
use bms_storage::{
    AutomationRuleStore, BuildingStore, DeviceEventStore, DeviceStore, EnergyUsageStore,
    LiveStatusStore, LocationStore, RoleStore, UserStore,
};
use std::sync::Arc;

/// handlers 共享的应用状态。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub resolver: Arc<RoleResolver>,
    pub gate: Arc<CommandGate>,
    pub automation: Arc<AutomationService>,
    pub runtime: Arc<RuntimeTracker>,
    pub planner: Arc<RulePlanner>,
    pub user_store: Arc<dyn UserStore>,
    pub building_store: Arc<dyn BuildingStore>,
    pub location_store: Arc<dyn LocationStore>,
    pub role_store: Arc<dyn RoleStore>,
    pub device_store: Arc<dyn DeviceStore>,
    pub status_store: Arc<dyn LiveStatusStore>,
    pub event_store: Arc<dyn DeviceEventStore>,
    pub rule_store: Arc<dyn AutomationRuleStore>,
    pub energy_store: Arc<dyn EnergyUsageStore>,
}
