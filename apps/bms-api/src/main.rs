//! 楼宇设备访问与自动化控制引擎 HTTP API。
//!
//! 启动流程：加载配置 → 初始化日志 → 组装存储与能力层 →
//! 挂载路由 → 启动后台巡检任务 → 监听 HTTP。

mod handlers;
mod middleware;
mod routes;
mod state;
mod sweep;
mod utils;

use axum::middleware as axum_middleware;
use bms_access::RoleResolver;
use bms_auth::{AuthService, JwtManager, hash_password};
use bms_automation::rules::{RuleExecutor, RulePlanner};
use bms_automation::{AutomationService, ShedConfig};
use bms_config::AppConfig;
use bms_control::CommandGate;
use bms_energy::EnergyMeter;
use bms_runtime::{RuntimePolicy, RuntimeTracker, TracingDispatcher};
use bms_storage::{
    InMemoryAutomationRuleStore, InMemoryAutomationStateStore, InMemoryBuildingStore,
    InMemoryDeviceEventStore, InMemoryDeviceStore, InMemoryEnergyUsageStore,
    InMemoryLiveStatusStore, InMemoryLocationStore, InMemoryRoleStore, InMemoryUserStore,
};
use bms_telemetry::init_tracing;
use std::sync::Arc;
use std::time::Duration;

pub use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    // 内存存储后端；默认种子一个系统管理员便于本地联调
    let admin_hash = hash_password("admin123")?;
    let user_store = Arc::new(InMemoryUserStore::with_default_admin(admin_hash));
    let building_store = Arc::new(InMemoryBuildingStore::new());
    let location_store = Arc::new(InMemoryLocationStore::new());
    let role_store = Arc::new(InMemoryRoleStore::new());
    let device_store = Arc::new(InMemoryDeviceStore::new());
    let status_store = Arc::new(InMemoryLiveStatusStore::new());
    let automation_store = Arc::new(InMemoryAutomationStateStore::new());
    let event_store = Arc::new(InMemoryDeviceEventStore::new());
    let rule_store = Arc::new(InMemoryAutomationRuleStore::new());
    let energy_store = Arc::new(InMemoryEnergyUsageStore::new());

    let jwt = JwtManager::new(
        config.jwt_secret.clone(),
        config.jwt_access_ttl_seconds,
        config.jwt_refresh_ttl_seconds,
    );
    let auth = Arc::new(AuthService::new(user_store.clone(), jwt));

    let resolver = Arc::new(RoleResolver::new(
        user_store.clone(),
        role_store.clone(),
        location_store.clone(),
        building_store.clone(),
    ));
    let runtime = Arc::new(RuntimeTracker::new(
        device_store.clone(),
        status_store.clone(),
        location_store.clone(),
        building_store.clone(),
        Arc::new(TracingDispatcher),
        RuntimePolicy {
            first_warning_hours: config.runtime_first_warning_hours,
            escalation_interval_hours: config.runtime_escalation_hours,
            min_warning_gap_minutes: config.runtime_warning_gap_minutes,
        },
    ));
    let energy = Arc::new(EnergyMeter::new(energy_store.clone()));
    let gate = Arc::new(CommandGate::new(
        resolver.clone(),
        device_store.clone(),
        status_store.clone(),
        location_store.clone(),
        automation_store.clone(),
        event_store.clone(),
        runtime.clone(),
        energy,
        Duration::from_millis(config.dependency_timeout_ms),
    ));
    let automation = Arc::new(AutomationService::new(
        automation_store.clone(),
        building_store.clone(),
        device_store.clone(),
        status_store.clone(),
        location_store.clone(),
        gate.clone(),
        ShedConfig {
            eco_types: config.eco_shed_types.clone(),
            night_types: config.night_shed_types.clone(),
        },
    ));
    let planner = Arc::new(RulePlanner::new(event_store.clone(), rule_store.clone()));
    let executor = Arc::new(RuleExecutor::new(
        rule_store.clone(),
        device_store.clone(),
        location_store.clone(),
        automation_store.clone(),
        gate.clone(),
    ));

    let state = AppState {
        auth,
        resolver,
        gate,
        automation,
        runtime: runtime.clone(),
        planner,
        user_store,
        building_store,
        location_store,
        role_store,
        device_store: device_store.clone(),
        status_store,
        event_store,
        rule_store,
        energy_store,
    };

    // 后台巡检：运行时长告警 + 到点规则执行
    sweep::spawn_sweep_task(
        runtime,
        executor,
        device_store,
        config.sweep_interval_seconds,
        config.rules_enabled,
    );

    let app = routes::create_api_router()
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(axum_middleware::from_fn(middleware::request_context));

    tracing::info!(target: "bms_api", addr = %config.http_addr, "listening");
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
