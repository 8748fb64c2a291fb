use bms_runtime::{
    EvaluateOutcome, NotificationDispatcher, RuntimeError, RuntimePolicy, RuntimeTracker,
    RuntimeWarning,
};
use bms_storage::{
    BuildingRecord, BuildingStore, DeviceRecord, DeviceStore, InMemoryBuildingStore,
    InMemoryDeviceStore, InMemoryLiveStatusStore, InMemoryLocationStore, LiveStatusRecord,
    LiveStatusStore, LocationRecord, LocationStore,
};
use domain::DeviceStatus;
use std::sync::{Arc, Mutex};

const HOUR_MS: i64 = 3_600_000;
const T0: i64 = 1_750_000_000_000;

/// 捕获告警的测试投递器。
struct CapturingDispatcher {
    sent: Mutex<Vec<RuntimeWarning>>,
}

impl CapturingDispatcher {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn count(&self) -> usize {
        self.sent.lock().map(|items| items.len()).unwrap_or(0)
    }

    fn last(&self) -> Option<RuntimeWarning> {
        self.sent.lock().ok().and_then(|items| items.last().cloned())
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for CapturingDispatcher {
    async fn send_runtime_warning(&self, warning: &RuntimeWarning) -> Result<(), RuntimeError> {
        if let Ok(mut items) = self.sent.lock() {
            items.push(warning.clone());
        }
        Ok(())
    }
}

struct Fixture {
    tracker: RuntimeTracker,
    devices: Arc<InMemoryDeviceStore>,
    statuses: Arc<InMemoryLiveStatusStore>,
    dispatcher: Arc<CapturingDispatcher>,
}

async fn fixture(policy: RuntimePolicy) -> Fixture {
    let devices = Arc::new(InMemoryDeviceStore::new());
    let statuses = Arc::new(InMemoryLiveStatusStore::new());
    let locations = Arc::new(InMemoryLocationStore::new());
    let buildings = Arc::new(InMemoryBuildingStore::new());
    let dispatcher = Arc::new(CapturingDispatcher::new());

    buildings
        .create_building(BuildingRecord {
            building_id: "bldg-1".to_string(),
            name: "Main".to_string(),
        })
        .await
        .expect("building");
    locations
        .create_location(LocationRecord {
            location_id: "loc-1".to_string(),
            building_id: "bldg-1".to_string(),
            name: "Lab".to_string(),
        })
        .await
        .expect("location");

    let tracker = RuntimeTracker::new(
        devices.clone(),
        statuses.clone(),
        locations,
        buildings,
        dispatcher.clone(),
        policy,
    );
    Fixture {
        tracker,
        devices,
        statuses,
        dispatcher,
    }
}

async fn seed_device(fx: &Fixture, device_id: &str, location: Option<&str>) {
    fx.devices
        .create_device(DeviceRecord {
            device_id: device_id.to_string(),
            name: format!("Device {device_id}"),
            device_type: "AC".to_string(),
            wattage_w: 1500,
            location_id: location.map(|value| value.to_string()),
            assigned_to: Vec::new(),
        })
        .await
        .expect("device");
}

async fn seed_on_status(fx: &Fixture, device_id: &str, on_since_ms: i64) {
    let mut record = LiveStatusRecord::initial(device_id);
    record.status = DeviceStatus::On;
    record.on_since_ms = Some(on_since_ms);
    let result = fx
        .statuses
        .put_status(record, None)
        .await
        .expect("seed status");
    assert!(result.applied);
}

#[tokio::test]
async fn first_warning_fires_at_five_hours() {
    let fx = fixture(RuntimePolicy::default()).await;
    seed_device(&fx, "d1", Some("loc-1")).await;
    seed_on_status(&fx, "d1", T0).await;

    let outcome = fx.tracker.evaluate_at("d1", T0 + 4 * HOUR_MS).await.expect("eval");
    assert_eq!(outcome, EvaluateOutcome::NotDue);
    assert_eq!(fx.dispatcher.count(), 0);

    let outcome = fx.tracker.evaluate_at("d1", T0 + 5 * HOUR_MS).await.expect("eval");
    assert_eq!(
        outcome,
        EvaluateOutcome::Warned {
            hours_on: 5,
            warning_ordinal: 1
        }
    );
    let warning = fx.dispatcher.last().expect("warning");
    assert_eq!(warning.device_id, "d1");
    assert_eq!(warning.location_name, "Lab");
    assert_eq!(warning.building_name, "Main");

    let status = fx.statuses.get_status("d1").await.expect("get").expect("status");
    assert_eq!(status.warning_count, 1);
    assert_eq!(status.last_warning_at_ms, Some(T0 + 5 * HOUR_MS));
}

#[tokio::test]
async fn escalation_follows_two_hour_cadence() {
    let fx = fixture(RuntimePolicy::default()).await;
    seed_device(&fx, "d1", Some("loc-1")).await;
    seed_on_status(&fx, "d1", T0).await;

    assert!(matches!(
        fx.tracker.evaluate_at("d1", T0 + 5 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::Warned { warning_ordinal: 1, .. }
    ));
    // 下一阈值 7h，6h 时不告警
    assert_eq!(
        fx.tracker.evaluate_at("d1", T0 + 6 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::NotDue
    );
    assert!(matches!(
        fx.tracker.evaluate_at("d1", T0 + 7 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::Warned { hours_on: 7, warning_ordinal: 2 }
    ));
    assert!(matches!(
        fx.tracker.evaluate_at("d1", T0 + 9 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::Warned { hours_on: 9, warning_ordinal: 3 }
    ));
    assert_eq!(fx.dispatcher.count(), 3);
}

#[tokio::test]
async fn minimum_gap_suppresses_back_to_back_warnings() {
    // 升级间隔压到 1h，使阈值先于防骚扰间隔到期
    let policy = RuntimePolicy {
        first_warning_hours: 5,
        escalation_interval_hours: 1,
        min_warning_gap_minutes: 90,
    };
    let fx = fixture(policy).await;
    seed_device(&fx, "d1", Some("loc-1")).await;
    seed_on_status(&fx, "d1", T0).await;

    assert!(matches!(
        fx.tracker.evaluate_at("d1", T0 + 5 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::Warned { warning_ordinal: 1, .. }
    ));
    // 6h：阈值已到但距上次仅 60 分钟
    assert_eq!(
        fx.tracker.evaluate_at("d1", T0 + 6 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::NotDue
    );
    // 6.5h：间隔满 90 分钟
    assert!(matches!(
        fx.tracker
            .evaluate_at("d1", T0 + 6 * HOUR_MS + 30 * 60_000)
            .await
            .expect("eval"),
        EvaluateOutcome::Warned { warning_ordinal: 2, .. }
    ));
}

#[tokio::test]
async fn off_and_unclaimed_devices_are_skipped() {
    let fx = fixture(RuntimePolicy::default()).await;
    seed_device(&fx, "d-off", Some("loc-1")).await;
    let result = fx
        .statuses
        .put_status(LiveStatusRecord::initial("d-off"), None)
        .await
        .expect("seed");
    assert!(result.applied);

    seed_device(&fx, "d-unclaimed", None).await;
    seed_on_status(&fx, "d-unclaimed", T0).await;

    assert_eq!(
        fx.tracker.evaluate_at("d-off", T0 + 10 * HOUR_MS).await.expect("eval"),
        EvaluateOutcome::Skipped
    );
    assert_eq!(
        fx.tracker
            .evaluate_at("d-unclaimed", T0 + 10 * HOUR_MS)
            .await
            .expect("eval"),
        EvaluateOutcome::Skipped
    );
    assert_eq!(fx.dispatcher.count(), 0);
}

#[tokio::test]
async fn missing_on_since_is_initialized_without_warning() {
    let fx = fixture(RuntimePolicy::default()).await;
    seed_device(&fx, "d1", Some("loc-1")).await;
    // 状态 On 但缺 on_since（历史数据修复路径）
    let mut record = LiveStatusRecord::initial("d1");
    record.status = DeviceStatus::On;
    let result = fx.statuses.put_status(record, None).await.expect("seed");
    assert!(result.applied);

    let now = T0 + 10 * HOUR_MS;
    assert_eq!(
        fx.tracker.evaluate_at("d1", now).await.expect("eval"),
        EvaluateOutcome::Initialized
    );
    let status = fx.statuses.get_status("d1").await.expect("get").expect("status");
    assert_eq!(status.on_since_ms, Some(now));
    assert_eq!(status.warning_count, 0);
    assert_eq!(fx.dispatcher.count(), 0);
}

#[tokio::test]
async fn sweep_reports_checked_and_sent() {
    let fx = fixture(RuntimePolicy::default()).await;
    seed_device(&fx, "d1", Some("loc-1")).await;
    seed_on_status(&fx, "d1", T0).await;
    seed_device(&fx, "d2", Some("loc-1")).await;
    seed_on_status(&fx, "d2", T0 + 4 * HOUR_MS).await;

    let ids = vec!["d1".to_string(), "d2".to_string(), "d-missing".to_string()];
    let report = fx.tracker.sweep_at(&ids, T0 + 5 * HOUR_MS).await.expect("sweep");
    assert_eq!(report.checked, 3);
    assert_eq!(report.warnings_sent, 1);
}
