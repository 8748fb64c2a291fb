use bms_storage::{InMemoryLiveStatusStore, LiveStatusRecord, LiveStatusStore};
use domain::DeviceStatus;

fn on_record(device_id: &str, now_ms: i64) -> LiveStatusRecord {
    LiveStatusRecord {
        device_id: device_id.to_string(),
        status: DeviceStatus::On,
        on_since_ms: Some(now_ms),
        last_warning_at_ms: None,
        warning_count: 0,
        version: 0,
    }
}

#[tokio::test]
async fn first_write_expects_no_record() {
    let store = InMemoryLiveStatusStore::new();
    let result = store
        .put_status(on_record("dev-1", 1_000), None)
        .await
        .expect("put");
    assert!(result.applied);
    assert_eq!(result.record.version, 1);
    assert_eq!(result.record.status, DeviceStatus::On);
}

#[tokio::test]
async fn stale_version_is_rejected_with_current_value() {
    let store = InMemoryLiveStatusStore::new();
    let first = store
        .put_status(on_record("dev-1", 1_000), None)
        .await
        .expect("put");
    assert!(first.applied);

    // 以过期的期望版本（None）再写：拒绝，返回当前记录
    let conflict = store
        .put_status(on_record("dev-1", 2_000), None)
        .await
        .expect("put");
    assert!(!conflict.applied);
    assert_eq!(conflict.record.version, 1);
    assert_eq!(conflict.record.on_since_ms, Some(1_000));

    // 以正确的期望版本重写：成功并递增版本
    let mut off = conflict.record.clone();
    off.status = DeviceStatus::Off;
    off.on_since_ms = None;
    let applied = store
        .put_status(off, Some(1))
        .await
        .expect("put");
    assert!(applied.applied);
    assert_eq!(applied.record.version, 2);
}

#[tokio::test]
async fn delete_then_get_none() {
    let store = InMemoryLiveStatusStore::new();
    store
        .put_status(on_record("dev-1", 1_000), None)
        .await
        .expect("put");
    assert!(store.delete_status("dev-1").await.expect("delete"));
    assert!(store.get_status("dev-1").await.expect("get").is_none());
}
