use bms_config::AppConfig;

#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("BMS_JWT_SECRET", "secret");
        std::env::set_var("BMS_JWT_ACCESS_TTL_SECONDS", "3600");
        std::env::set_var("BMS_JWT_REFRESH_TTL_SECONDS", "7200");
        std::env::set_var("BMS_HTTP_ADDR", "127.0.0.1:8081");
        std::env::set_var("BMS_NIGHT_SHED_TYPES", "Fan, AC ,Heater");
    }

    let config = AppConfig::from_env().expect("config");
    assert_eq!(config.http_addr, "127.0.0.1:8081");
    assert_eq!(config.jwt_access_ttl_seconds, 3600);
    assert_eq!(config.jwt_refresh_ttl_seconds, 7200);
    // 策略常量默认值保持既有行为
    assert_eq!(config.runtime_first_warning_hours, 5);
    assert_eq!(config.runtime_escalation_hours, 2);
    assert_eq!(config.runtime_warning_gap_minutes, 90);
    assert_eq!(config.eco_shed_types, vec!["AC".to_string()]);
    assert_eq!(
        config.night_shed_types,
        vec!["Fan".to_string(), "AC".to_string(), "Heater".to_string()]
    );
    assert!(!config.rules_enabled);
}
