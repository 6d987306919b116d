// Config loading and validation tests

use clap::Parser;
use nvmeof_top::cli::Args;
use nvmeof_top::config::AppConfig;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[gateway]
addr = "10.0.0.5"
port = 5501
rpc_timeout_ms = 2500

[collector]
delay_secs = 2
fanout_limit = 16

[logging]
level = "debug"

[synthetic]
namespaces = 12
reactor_cores = 2
seed = 99
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.gateway_addr(), Some("10.0.0.5"));
    assert_eq!(config.gateway.port, 5501);
    assert_eq!(config.collector.delay_secs, 2);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.synthetic.seed, Some(99));

    let rpc = config.rpc_settings();
    assert_eq!(rpc.rpc_timeout, Duration::from_millis(2500));
    assert_eq!(rpc.fanout_limit, 16);
    let synthetic = config.synthetic_settings();
    assert_eq!(synthetic.namespaces, 12);
    assert_eq!(synthetic.reactor_cores, 2);
    assert_eq!(synthetic.fail_after_cycles, None);
}

#[test]
fn test_config_defaults_when_omitted() {
    let config = AppConfig::load_from_str("").expect("empty config is valid");
    assert_eq!(config.gateway_addr(), None);
    assert_eq!(config.gateway.port, 5500);
    assert_eq!(config.gateway.rpc_timeout_ms, 5000);
    assert_eq!(config.collector.delay_secs, 3);
    assert_eq!(config.collector.fanout_limit, 32);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.synthetic.namespaces, 8);
}

#[test]
fn test_blank_addr_counts_as_missing() {
    let config = AppConfig::load_from_str("[gateway]\naddr = \"  \"\n").unwrap();
    assert_eq!(config.gateway_addr(), None);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 5501", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("gateway.port"));
}

#[test]
fn test_config_validation_rejects_rpc_timeout_zero() {
    let bad = VALID_CONFIG.replace("rpc_timeout_ms = 2500", "rpc_timeout_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("rpc_timeout_ms"));
}

#[test]
fn test_config_validation_rejects_delay_zero() {
    let bad = VALID_CONFIG.replace("delay_secs = 2", "delay_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collector.delay_secs"));
}

#[test]
fn test_config_validation_rejects_delay_above_one_hour() {
    let bad = VALID_CONFIG.replace("delay_secs = 2", "delay_secs = 86400");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collector.delay_secs"));

    let edge = VALID_CONFIG.replace("delay_secs = 2", "delay_secs = 3600");
    assert_eq!(AppConfig::load_from_str(&edge).unwrap().collector.delay_secs, 3600);
}

#[test]
fn test_config_validation_rejects_fanout_limit_zero() {
    let bad = VALID_CONFIG.replace("fanout_limit = 16", "fanout_limit = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("fanout_limit"));
}

#[test]
fn test_config_validation_rejects_zero_synthetic_namespaces() {
    let bad = VALID_CONFIG.replace("namespaces = 12", "namespaces = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("synthetic.namespaces"));
}

#[test]
fn test_config_validation_rejects_invalid_toml() {
    let err = AppConfig::load_from_str("not valid toml [[[").unwrap_err();
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_config_load_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nvmeof-top.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    let config = AppConfig::load(Some(&path)).expect("load from file");
    assert_eq!(config.gateway.port, 5501);
    assert_eq!(config.collector.fanout_limit, 16);
}

#[test]
fn test_config_load_missing_explicit_file_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_args_override_file_values() {
    let mut config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    let args = Args::try_parse_from([
        "nvmeof-top",
        "-n",
        "nqn.2016-06.io.spdk:cnode1",
        "-a",
        "192.168.1.20",
        "-p",
        "6000",
        "-d",
        "7",
    ])
    .unwrap();
    config.apply_args(&args).unwrap();
    assert_eq!(config.gateway_addr(), Some("192.168.1.20"));
    assert_eq!(config.gateway.port, 6000);
    assert_eq!(config.collector.delay_secs, 7);
    assert_eq!(config.collector.fanout_limit, 16);
}
