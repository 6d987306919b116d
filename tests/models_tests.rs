// Model serialization tests (JSON camelCase)

use nvmeof_top::models::*;

#[test]
fn test_namespace_serialization_camel_case() {
    let ns = Namespace {
        nsid: 3,
        bdev_name: "bdev_3".into(),
        rbd_pool_name: "rbd".into(),
        rbd_image_name: "disk3".into(),
        load_balancing_group: 2,
        qos: QosLimits {
            rw_ios_per_second: 500,
            ..Default::default()
        },
    };
    let json = serde_json::to_string(&ns).unwrap();
    assert!(json.contains("\"bdevName\""));
    assert!(json.contains("\"loadBalancingGroup\""));
    assert!(json.contains("\"rwIosPerSecond\""));
    let back: Namespace = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ns);
    assert_eq!(back.rbd_path(), "rbd/disk3");
}

#[test]
fn test_namespace_without_qos_defaults_to_no_limits() {
    let json = r#"{"nsid":1,"bdevName":"b","rbdPoolName":"p","rbdImageName":"i","loadBalancingGroup":0}"#;
    let ns: Namespace = serde_json::from_str(json).unwrap();
    assert!(!ns.qos.enabled());
}

#[test]
fn test_io_stats_sample_json_fields() {
    let s = IoStatsSample {
        num_read_ops: 10,
        tick_rate: 1000,
        read_latency_ticks: 500,
        ..Default::default()
    };
    let json = serde_json::to_string(&s).unwrap();
    assert!(json.contains("\"numReadOps\":10"));
    assert!(json.contains("\"tickRate\":1000"));
    assert_eq!(s.read_latency_secs(), 0.5);
}

#[test]
fn test_health_display() {
    assert_eq!(CollectorHealth::healthy().to_string(), "healthy");
    let h = CollectorHealth::degraded(8, "endpoint gone");
    assert_eq!(h.to_string(), "[8] endpoint gone");
    assert!(!h.is_healthy());
    let json = serde_json::to_string(&h).unwrap();
    assert_eq!(json, r#"{"code":8,"message":"endpoint gone"}"#);
}

#[test]
fn test_sort_key_round_trips_through_heading() {
    for key in SortKey::ALL {
        assert_eq!(key.heading().parse::<SortKey>().unwrap(), key);
        assert_eq!(key.to_string(), key.heading());
    }
}
