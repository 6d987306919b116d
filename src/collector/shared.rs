// State shared by every collector variant, its two locks, and the read accessors.
//
// Lock order: `state` (coarse, async) before `iostats` (fine, sync). The fine lock is only
// reachable through a `StateGuard`, so it can never be taken without the coarse one.

use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::gateway::GatewayError;
use crate::models::{
    CollectorHealth, CollectorSnapshot, ConnectionInfo, GatewayInfo, IoStatsSample, Namespace,
    NamespaceRow, SortKey, SubsystemSummary,
};
use crate::stats::PerformanceStats;

/// Successful cycles needed before rates have a real baseline.
pub const MIN_SAMPLES: u8 = 2;
/// Longest accepted poll interval, one hour.
pub const MAX_DELAY_SECS: u64 = 3600;

/// Everything replaced or read as a unit under the coarse lock.
#[derive(Debug, Default)]
pub struct CollectorState {
    pub subsystem: String,
    pub delay_secs: u64,
    pub namespaces: Vec<Namespace>,
    pub subsystems: Vec<SubsystemSummary>,
    pub connections: Vec<ConnectionInfo>,
    pub cpu_stats: BTreeMap<String, f64>,
    pub timestamp: Option<u64>,
}

pub struct CollectorCore {
    state: tokio::sync::Mutex<CollectorState>,
    iostats: Mutex<HashMap<String, PerformanceStats>>,
    health: RwLock<CollectorHealth>,
    samples: AtomicU8,
    gateway: OnceLock<GatewayInfo>,
    cpu_stats_enabled: bool,
}

/// Coarse-lock guard. Derefs to the state and hands out the stats-map lock.
pub struct StateGuard<'a> {
    state: tokio::sync::MutexGuard<'a, CollectorState>,
    iostats: &'a Mutex<HashMap<String, PerformanceStats>>,
    samples: &'a AtomicU8,
}

impl Deref for StateGuard<'_> {
    type Target = CollectorState;

    fn deref(&self) -> &CollectorState {
        &self.state
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut CollectorState {
        &mut self.state
    }
}

impl StateGuard<'_> {
    /// Fine-grained lock over the bdev -> PerformanceStats map. Do not hold across an await.
    pub fn iostats(&self) -> MutexGuard<'_, HashMap<String, PerformanceStats>> {
        self.iostats.lock()
    }

    /// Apply one cycle's samples and drop entries for bdevs that are no longer present.
    /// Samples arrive after the fan-out is joined, so this lock is uncontended in practice.
    pub fn apply_io_samples(&self, samples: Vec<(String, IoStatsSample)>) {
        let mut iostats = self.iostats();
        let live: HashSet<&str> = samples.iter().map(|(bdev, _)| bdev.as_str()).collect();
        iostats.retain(|bdev, _| live.contains(bdev.as_str()));
        for (bdev, sample) in &samples {
            iostats
                .entry(bdev.clone())
                .or_insert_with(|| PerformanceStats::new(bdev.clone()))
                .update(sample);
        }
    }

    /// Stamp the cycle and advance the readiness counter (saturating at MIN_SAMPLES).
    pub fn record_sample(&mut self) {
        self.state.timestamp = Some(epoch_secs());
        let count = self.samples.load(Ordering::Acquire);
        if count < MIN_SAMPLES {
            self.samples.store(count + 1, Ordering::Release);
        }
    }

    pub fn reset_namespace_data(&mut self) {
        self.iostats().clear();
        self.state.namespaces.clear();
        self.state.connections.clear();
        self.samples.store(0, Ordering::Release);
    }

    fn rows(&self) -> Vec<NamespaceRow> {
        let delay = self.state.delay_secs as f64;
        let iostats = self.iostats();
        self.state
            .namespaces
            .iter()
            .map(|ns| NamespaceRow {
                nsid: ns.nsid,
                bdev_name: ns.bdev_name.clone(),
                rbd_image: ns.rbd_path(),
                rates: iostats
                    .get(&ns.bdev_name)
                    .map(|s| s.calculate(delay))
                    .unwrap_or_default(),
                load_balancing_group: ns.load_balancing_group,
                qos_enabled: ns.qos.enabled(),
            })
            .collect()
    }

    fn sorted_rows(&self, sort_key: SortKey, descending: bool) -> Vec<NamespaceRow> {
        let mut rows = self.rows();
        sort_key.sort(&mut rows, descending);
        rows
    }

    fn max_namespaces(&self) -> Option<u32> {
        self.state
            .subsystems
            .iter()
            .find(|s| s.nqn == self.state.subsystem)
            .map(|s| s.max_namespaces)
    }
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}

impl CollectorCore {
    pub fn new(subsystem: impl Into<String>, delay_secs: u64, cpu_stats_enabled: bool) -> Self {
        Self {
            state: tokio::sync::Mutex::new(CollectorState {
                subsystem: subsystem.into(),
                delay_secs: delay_secs.clamp(1, MAX_DELAY_SECS),
                ..Default::default()
            }),
            iostats: Mutex::new(HashMap::new()),
            health: RwLock::new(CollectorHealth::healthy()),
            samples: AtomicU8::new(0),
            gateway: OnceLock::new(),
            cpu_stats_enabled,
        }
    }

    /// Take the coarse lock. Writers hold it for a whole poll cycle.
    pub async fn lock(&self) -> StateGuard<'_> {
        StateGuard {
            state: self.state.lock().await,
            iostats: &self.iostats,
            samples: &self.samples,
        }
    }

    pub fn ready(&self) -> bool {
        self.health.read().is_healthy()
    }

    pub fn samples_ready(&self) -> bool {
        self.ready() && self.samples.load(Ordering::Acquire) >= MIN_SAMPLES
    }

    pub fn health(&self) -> CollectorHealth {
        self.health.read().clone()
    }

    /// Records a failure. The first failure wins and is never cleared; returns the effective health.
    pub fn degrade(&self, health: CollectorHealth) -> CollectorHealth {
        let mut current = self.health.write();
        if current.is_healthy() {
            tracing::error!(code = health.code, message = %health.message, "collector degraded");
            *current = health;
        }
        current.clone()
    }

    pub fn gateway_info(&self) -> Option<&GatewayInfo> {
        self.gateway.get()
    }

    pub fn set_gateway_info(&self, info: GatewayInfo) {
        if self.gateway.set(info).is_err() {
            tracing::debug!("gateway info already recorded");
        }
    }

    pub fn cpu_stats_enabled(&self) -> bool {
        self.cpu_stats_enabled
    }

    pub async fn get_sorted_namespaces(
        &self,
        sort_key: SortKey,
        descending: bool,
    ) -> Vec<NamespaceRow> {
        self.lock().await.sorted_rows(sort_key, descending)
    }

    /// Reactor thread -> busy percent. Empty when the backend has no per-core telemetry.
    pub async fn get_cpu_stats(&self) -> BTreeMap<String, f64> {
        if !self.cpu_stats_enabled {
            return BTreeMap::new();
        }
        self.lock().await.cpu_stats.clone()
    }

    pub async fn total_iops(&self) -> f64 {
        self.lock()
            .await
            .rows()
            .iter()
            .map(|r| r.rates.total_ops_per_sec)
            .sum()
    }

    /// Bytes per second across all namespaces.
    pub async fn total_bandwidth(&self) -> f64 {
        self.lock()
            .await
            .rows()
            .iter()
            .map(|r| r.rates.total_bytes_per_sec)
            .sum()
    }

    pub async fn connections_active(&self) -> usize {
        self.lock()
            .await
            .connections
            .iter()
            .filter(|c| c.connected)
            .count()
    }

    pub async fn connections_defined(&self) -> usize {
        self.lock().await.connections.len()
    }

    pub async fn total_namespaces_defined(&self) -> usize {
        self.lock().await.namespaces.len()
    }

    pub async fn total_subsystems(&self) -> usize {
        self.lock().await.subsystems.len()
    }

    pub async fn subsystem(&self) -> String {
        self.lock().await.subsystem.clone()
    }

    pub async fn subsystem_nqns(&self) -> Vec<String> {
        self.lock()
            .await
            .subsystems
            .iter()
            .map(|s| s.nqn.clone())
            .collect()
    }

    pub async fn timestamp(&self) -> Option<u64> {
        self.lock().await.timestamp
    }

    pub async fn delay_secs(&self) -> u64 {
        self.lock().await.delay_secs
    }

    /// Switch the polling target between cycles and drop all per-bdev history for it.
    pub async fn update_subsystem(&self, nqn: &str) -> Result<(), GatewayError> {
        let mut locked = self.lock().await;
        if !locked.subsystems.iter().any(|s| s.nqn == nqn) {
            return Err(GatewayError::UnknownSubsystem {
                nqn: nqn.to_string(),
            });
        }
        tracing::info!(from = %locked.subsystem, to = %nqn, "switching monitored subsystem");
        locked.subsystem = nqn.to_string();
        locked.reset_namespace_data();
        Ok(())
    }

    pub async fn reset_namespace_data(&self) {
        self.lock().await.reset_namespace_data();
    }

    /// Change the poll interval; rates need a fresh baseline so the sample counter restarts.
    pub async fn update_delay(&self, delay_secs: u64) {
        let mut locked = self.lock().await;
        locked.delay_secs = delay_secs.clamp(1, MAX_DELAY_SECS);
        self.samples.store(0, Ordering::Release);
    }

    pub async fn snapshot(&self, sort_key: SortKey, descending: bool) -> CollectorSnapshot {
        let locked = self.lock().await;
        let rows = locked.sorted_rows(sort_key, descending);
        CollectorSnapshot {
            timestamp: locked.timestamp,
            subsystem: locked.subsystem.clone(),
            delay_secs: locked.delay_secs,
            health: self.health(),
            samples_ready: self.samples_ready(),
            gateway: self.gateway.get().cloned(),
            total_iops: rows.iter().map(|r| r.rates.total_ops_per_sec).sum(),
            total_bandwidth: rows.iter().map(|r| r.rates.total_bytes_per_sec).sum(),
            namespaces_defined: locked.namespaces.len(),
            max_namespaces: locked.max_namespaces(),
            connections_active: locked.connections.iter().filter(|c| c.connected).count(),
            connections_defined: locked.connections.len(),
            total_subsystems: locked.subsystems.len(),
            cpu_stats: if self.cpu_stats_enabled {
                locked.cpu_stats.clone()
            } else {
                BTreeMap::new()
            },
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace(nsid: u32, bdev: &str) -> Namespace {
        Namespace {
            nsid,
            bdev_name: bdev.to_string(),
            rbd_pool_name: "rbd".into(),
            rbd_image_name: format!("img{nsid}"),
            load_balancing_group: 1,
            qos: Default::default(),
        }
    }

    fn reads(n: u64) -> IoStatsSample {
        IoStatsSample {
            num_read_ops: n,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sample_counter_saturates_at_threshold() {
        let core = CollectorCore::new("nqn.2016-06.io.spdk:cnode1", 1, false);
        for _ in 0..5 {
            core.lock().await.record_sample();
        }
        assert_eq!(core.samples.load(Ordering::Acquire), MIN_SAMPLES);
        assert!(core.samples_ready());
    }

    #[tokio::test]
    async fn degraded_health_is_terminal() {
        let core = CollectorCore::new("nqn.2016-06.io.spdk:cnode1", 1, false);
        core.lock().await.record_sample();
        core.lock().await.record_sample();
        let first = core.degrade(CollectorHealth::degraded(8, "endpoint gone"));
        let second = core.degrade(CollectorHealth::degraded(9, "later"));
        assert_eq!(first, second);
        assert_eq!(core.health().code, 8);
        assert!(!core.ready());
        assert!(!core.samples_ready());
    }

    #[tokio::test]
    async fn apply_drops_bdevs_that_disappeared() {
        let core = CollectorCore::new("nqn.2016-06.io.spdk:cnode1", 1, false);
        let locked = core.lock().await;
        locked.apply_io_samples(vec![("a".into(), reads(1)), ("b".into(), reads(1))]);
        locked.apply_io_samples(vec![("a".into(), reads(5))]);
        let iostats = locked.iostats();
        assert_eq!(iostats.len(), 1);
        assert_eq!(iostats["a"].read_ops.current(), 5.0);
        assert_eq!(iostats["a"].read_ops.previous(), 1.0);
    }

    #[tokio::test]
    async fn rows_without_stats_default_to_zero_rates() {
        let core = CollectorCore::new("nqn.2016-06.io.spdk:cnode1", 1, false);
        core.lock().await.namespaces = vec![namespace(1, "missing")];
        let rows = core.get_sorted_namespaces(SortKey::Nsid, false).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rates.total_ops_per_sec, 0.0);
        assert_eq!(rows[0].rbd_image, "rbd/img1");
    }

    #[tokio::test]
    async fn cpu_stats_hidden_when_backend_has_none() {
        let core = CollectorCore::new("nqn.2016-06.io.spdk:cnode1", 1, false);
        core.lock()
            .await
            .cpu_stats
            .insert("reactor_0".into(), 50.0);
        assert!(core.get_cpu_stats().await.is_empty());
    }

    #[tokio::test]
    async fn update_delay_restarts_readiness() {
        let core = CollectorCore::new("nqn.2016-06.io.spdk:cnode1", 3, false);
        core.lock().await.record_sample();
        core.lock().await.record_sample();
        assert!(core.samples_ready());
        core.update_delay(0).await;
        assert!(!core.samples_ready());
        assert_eq!(core.delay_secs().await, 1);
    }
}
