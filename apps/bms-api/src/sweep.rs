//! 后台巡检任务：周期性运行时长告警与到点规则执行。

use bms_automation::rules::RuleExecutor;
use bms_runtime::RuntimeTracker;
use bms_storage::DeviceStore;
use std::sync::Arc;
use std::time::Duration;

/// 启动周期巡检任务。
///
/// 每轮先跑运行时长巡检，再按配置执行到点的自动化规则。
/// 任一环节失败只记日志，任务本身不退出。
pub fn spawn_sweep_task(
    runtime: Arc<RuntimeTracker>,
    executor: Arc<RuleExecutor>,
    device_store: Arc<dyn DeviceStore>,
    interval_seconds: u64,
    rules_enabled: bool,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        // 首个 tick 立即返回，跳过以避免启动瞬间巡检
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let device_ids = match device_store.list_devices().await {
                Ok(devices) => devices
                    .into_iter()
                    .map(|device| device.device_id)
                    .collect::<Vec<_>>(),
                Err(err) => {
                    tracing::warn!(target: "bms_api", error = %err, "sweep device listing failed");
                    continue;
                }
            };
            if let Err(err) = runtime.sweep(&device_ids).await {
                tracing::warn!(target: "bms_api", error = %err, "runtime sweep failed");
            }
            if rules_enabled {
                match executor.execute_due_rules().await {
                    Ok(report) => {
                        if report.commands_issued > 0 {
                            tracing::info!(
                                target: "bms_api",
                                evaluated = report.evaluated,
                                commands_issued = report.commands_issued,
                                "scheduled rules executed"
                            );
                        }
                    }
                    Err(err) => {
                        tracing::warn!(target: "bms_api", error = %err, "rule execution failed");
                    }
                }
            }
        }
    });
}
