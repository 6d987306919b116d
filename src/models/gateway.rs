// Gateway response DTOs (transport-agnostic; the gRPC client converts into these)

use serde::{Deserialize, Serialize};

/// Static gateway identity; fetched once at initialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInfo {
    pub version: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemSummary {
    pub nqn: String,
    pub max_namespaces: u32,
}

/// Per-namespace QoS caps. Zero means "no limit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosLimits {
    pub rw_ios_per_second: u64,
    pub rw_mbytes_per_second: u64,
    pub r_mbytes_per_second: u64,
    pub w_mbytes_per_second: u64,
}

impl QosLimits {
    pub fn enabled(&self) -> bool {
        self.rw_ios_per_second > 0
            || self.rw_mbytes_per_second > 0
            || self.r_mbytes_per_second > 0
            || self.w_mbytes_per_second > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub nsid: u32,
    pub bdev_name: String,
    pub rbd_pool_name: String,
    pub rbd_image_name: String,
    pub load_balancing_group: u32,
    #[serde(default)]
    pub qos: QosLimits,
}

impl Namespace {
    /// "pool/image" as shown in the namespace table.
    pub fn rbd_path(&self) -> String {
        format!("{}/{}", self.rbd_pool_name, self.rbd_image_name)
    }
}

/// Raw cumulative IO counters for one namespace. Latencies are in gateway ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoStatsSample {
    pub num_read_ops: u64,
    pub bytes_read: u64,
    pub read_latency_ticks: u64,
    pub num_write_ops: u64,
    pub bytes_written: u64,
    pub write_latency_ticks: u64,
    pub tick_rate: u64,
}

impl IoStatsSample {
    pub fn read_latency_secs(&self) -> f64 {
        ticks_to_secs(self.read_latency_ticks, self.tick_rate)
    }

    pub fn write_latency_secs(&self) -> f64 {
        ticks_to_secs(self.write_latency_ticks, self.tick_rate)
    }
}

fn ticks_to_secs(ticks: u64, tick_rate: u64) -> f64 {
    if tick_rate == 0 {
        0.0
    } else {
        ticks as f64 / tick_rate as f64
    }
}

/// One host connection to the monitored subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub client_nqn: String,
    pub address: String,
    pub connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qos_enabled_when_any_limit_set() {
        assert!(!QosLimits::default().enabled());
        let q = QosLimits {
            w_mbytes_per_second: 10,
            ..Default::default()
        };
        assert!(q.enabled());
    }

    #[test]
    fn latency_secs_is_zero_without_tick_rate() {
        let s = IoStatsSample {
            read_latency_ticks: 5_000,
            ..Default::default()
        };
        assert_eq!(s.read_latency_secs(), 0.0);
    }

    #[test]
    fn latency_secs_divides_by_tick_rate() {
        let s = IoStatsSample {
            write_latency_ticks: 3_000_000,
            tick_rate: 1_000_000,
            ..Default::default()
        };
        assert_eq!(s.write_latency_secs(), 3.0);
    }
}
