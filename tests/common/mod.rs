// Shared test helpers: a scripted in-memory gateway

#![allow(dead_code)]

use async_trait::async_trait;
use nvmeof_top::gateway::{GatewayApi, GatewayError};
use nvmeof_top::models::*;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const NQN: &str = "nqn.2016-06.io.spdk:cnode1";
pub const OTHER_NQN: &str = "nqn.2016-06.io.spdk:cnode2";

#[derive(Debug, Default)]
pub struct FakeState {
    pub info: Option<GatewayInfo>,
    pub subsystems: Vec<SubsystemSummary>,
    /// subsystem nqn -> namespaces
    pub namespaces: HashMap<String, Vec<Namespace>>,
    /// nsid -> cumulative counters
    pub io_stats: HashMap<u32, IoStatsSample>,
    pub connections: Vec<ConnectionInfo>,
    pub fail_gateway_info: bool,
    pub fail_list_namespaces: bool,
    pub fail_io_stats_for: Option<u32>,
    /// Delay applied to every io stats call.
    pub io_stats_delay: Option<Duration>,
    pub calls: HashMap<&'static str, usize>,
}

/// Cloning shares the script, so a test can keep a handle after giving one to a collector.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
}

pub fn unavailable() -> GatewayError {
    GatewayError::Unavailable {
        server: "fake:5500".into(),
        detail: "connection refused".into(),
    }
}

pub fn namespace(nsid: u32, bdev: &str) -> Namespace {
    Namespace {
        nsid,
        bdev_name: bdev.to_string(),
        rbd_pool_name: "rbd".into(),
        rbd_image_name: format!("image{nsid}"),
        load_balancing_group: 1,
        qos: QosLimits::default(),
    }
}

pub fn reads(num_read_ops: u64) -> IoStatsSample {
    IoStatsSample {
        num_read_ops,
        bytes_read: num_read_ops * 4096,
        tick_rate: 1_000_000,
        ..Default::default()
    }
}

impl FakeGateway {
    /// One subsystem (`NQN`) with no namespaces, plus `OTHER_NQN`.
    pub fn new() -> Self {
        let gw = Self::default();
        {
            let mut s = gw.state();
            s.info = Some(GatewayInfo {
                version: "1.2.0".into(),
                name: "gw-test".into(),
            });
            s.subsystems = vec![
                SubsystemSummary {
                    nqn: NQN.into(),
                    max_namespaces: 256,
                },
                SubsystemSummary {
                    nqn: OTHER_NQN.into(),
                    max_namespaces: 32,
                },
            ];
        }
        gw
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock()
    }

    pub fn set_namespaces(&self, subsystem: &str, namespaces: Vec<Namespace>) {
        self.state()
            .namespaces
            .insert(subsystem.to_string(), namespaces);
    }

    pub fn set_io(&self, nsid: u32, sample: IoStatsSample) {
        self.state().io_stats.insert(nsid, sample);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state().calls.get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.state().calls.entry(method).or_default() += 1;
    }
}

#[async_trait]
impl GatewayApi for FakeGateway {
    fn server(&self) -> &str {
        "fake:5500"
    }

    async fn gateway_info(&self) -> Result<GatewayInfo, GatewayError> {
        self.record("get_gateway_info");
        let s = self.state();
        if s.fail_gateway_info {
            return Err(unavailable());
        }
        s.info.clone().ok_or_else(unavailable)
    }

    async fn list_subsystems(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<SubsystemSummary>, GatewayError> {
        self.record("list_subsystems");
        let s = self.state();
        Ok(s.subsystems
            .iter()
            .filter(|sub| filter.is_none_or(|f| f == sub.nqn))
            .cloned()
            .collect())
    }

    async fn list_namespaces(&self, subsystem: &str) -> Result<Vec<Namespace>, GatewayError> {
        self.record("list_namespaces");
        let s = self.state();
        if s.fail_list_namespaces {
            return Err(unavailable());
        }
        Ok(s.namespaces.get(subsystem).cloned().unwrap_or_default())
    }

    async fn namespace_io_stats(
        &self,
        _subsystem: &str,
        nsid: u32,
    ) -> Result<IoStatsSample, GatewayError> {
        self.record("namespace_get_io_stats");
        let delay = self.state().io_stats_delay;
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let s = self.state();
        if s.fail_io_stats_for == Some(nsid) {
            return Err(GatewayError::Rejected {
                method: "namespace_get_io_stats",
                status: 2,
                message: format!("namespace {nsid} not found"),
            });
        }
        Ok(s.io_stats.get(&nsid).copied().unwrap_or_default())
    }

    async fn list_connections(
        &self,
        _subsystem: &str,
    ) -> Result<Vec<ConnectionInfo>, GatewayError> {
        self.record("list_connections");
        Ok(self.state().connections.clone())
    }
}
