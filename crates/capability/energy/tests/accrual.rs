use bms_energy::{EnergyMeter, date_key};
use bms_storage::{DeviceRecord, EnergyUsageStore, InMemoryEnergyUsageStore};
use std::sync::Arc;

fn device(wattage_w: i64) -> DeviceRecord {
    DeviceRecord {
        device_id: "d1".to_string(),
        name: "AC Unit".to_string(),
        device_type: "AC".to_string(),
        wattage_w,
        location_id: Some("loc-1".to_string()),
        assigned_to: Vec::new(),
    }
}

#[tokio::test]
async fn off_transition_accrues_into_daily_record() {
    let store = Arc::new(InMemoryEnergyUsageStore::new());
    let meter = EnergyMeter::new(store.clone());

    // 1500W 开 2 小时
    let now_ms = 1_749_988_800_000;
    let on_since = now_ms - 2 * 3_600_000;
    let record = meter
        .accrue_off(&device(1500), on_since, now_ms)
        .await
        .expect("accrue")
        .expect("record");
    assert_eq!(record.usage_kwh, 3.0);
    assert_eq!(record.date, date_key(now_ms));

    // 同日第二段会话累加
    let record = meter
        .accrue_off(&device(1500), now_ms, now_ms + 3_600_000)
        .await
        .expect("accrue")
        .expect("record");
    assert_eq!(record.usage_kwh, 4.5);

    let daily = store
        .get_daily("d1", &record.date)
        .await
        .expect("get")
        .expect("daily");
    assert_eq!(daily.usage_kwh, 4.5);
}

#[tokio::test]
async fn non_positive_session_is_ignored() {
    let store = Arc::new(InMemoryEnergyUsageStore::new());
    let meter = EnergyMeter::new(store);

    let now_ms = 1_749_988_800_000;
    assert!(
        meter
            .accrue_off(&device(1500), now_ms + 1_000, now_ms)
            .await
            .expect("accrue")
            .is_none()
    );
    assert!(
        meter
            .accrue_off(&device(0), now_ms - 3_600_000, now_ms)
            .await
            .expect("accrue")
            .is_none()
    );
}
