// Consistent point-in-time view of a collector, taken under one lock acquisition

use serde::Serialize;
use std::collections::BTreeMap;

use super::{CollectorHealth, GatewayInfo, NamespaceRow};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorSnapshot {
    /// Epoch seconds of the last successful poll cycle.
    pub timestamp: Option<u64>,
    pub subsystem: String,
    pub delay_secs: u64,
    pub health: CollectorHealth,
    pub samples_ready: bool,
    pub gateway: Option<GatewayInfo>,
    pub rows: Vec<NamespaceRow>,
    pub total_iops: f64,
    pub total_bandwidth: f64,
    pub namespaces_defined: usize,
    pub max_namespaces: Option<u32>,
    pub connections_active: usize,
    pub connections_defined: usize,
    pub total_subsystems: usize,
    /// Reactor thread name -> busy percent; empty when the backend has no per-core telemetry.
    pub cpu_stats: BTreeMap<String, f64>,
}
