use bms_telemetry::{metrics, new_request_ids, record_command_received};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
}

#[test]
fn counters_accumulate() {
    let before = metrics().snapshot().commands_received;
    record_command_received();
    let after = metrics().snapshot().commands_received;
    assert!(after > before);
}
