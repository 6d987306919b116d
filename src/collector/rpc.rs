// Gateway-backed collector: initialise once, then one bounded fan-out per poll cycle.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::health::health_from_error;
use super::shared::CollectorCore;
use super::Collector;
use crate::gateway::{GatewayApi, GatewayError, bounded};
use crate::models::{CollectorHealth, IoStatsSample, Namespace};
use crate::version;

#[derive(Debug, Clone, Copy)]
pub struct RpcSettings {
    /// Upper bound for every individual gateway call.
    pub rpc_timeout: Duration,
    /// Max concurrent per-namespace stat fetches in one cycle.
    pub fanout_limit: usize,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(5),
            fanout_limit: 32,
        }
    }
}

pub struct RpcCollector<G: GatewayApi> {
    core: CollectorCore,
    gateway: Arc<G>,
    settings: RpcSettings,
}

impl<G: GatewayApi> RpcCollector<G> {
    pub fn new(
        gateway: G,
        subsystem: impl Into<String>,
        delay_secs: u64,
        settings: RpcSettings,
    ) -> Self {
        Self {
            core: CollectorCore::new(subsystem, delay_secs, false),
            gateway: Arc::new(gateway),
            settings,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    fn fail(&self, err: GatewayError) -> CollectorHealth {
        self.core.degrade(health_from_error(&err))
    }

    /// Fetches IO counters for every namespace, at most `fanout_limit` at a time.
    /// Any failure cancels the remaining fetches.
    async fn fetch_io_stats(
        &self,
        subsystem: &str,
        namespaces: &[Namespace],
    ) -> Result<Vec<(String, IoStatsSample)>, GatewayError> {
        let permits = Arc::new(Semaphore::new(self.settings.fanout_limit.max(1)));
        let timeout = self.settings.rpc_timeout;
        let mut tasks = JoinSet::new();
        for ns in namespaces {
            let gateway = Arc::clone(&self.gateway);
            let permits = Arc::clone(&permits);
            let subsystem = subsystem.to_string();
            let (nsid, bdev) = (ns.nsid, ns.bdev_name.clone());
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| GatewayError::TaskFailed {
                        detail: e.to_string(),
                    })?;
                let sample = bounded(
                    "namespace_get_io_stats",
                    timeout,
                    gateway.namespace_io_stats(&subsystem, nsid),
                )
                .await?;
                Ok::<_, GatewayError>((bdev, sample))
            });
        }

        let mut samples = Vec::with_capacity(namespaces.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(sample)) => samples.push(sample),
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(GatewayError::TaskFailed {
                        detail: e.to_string(),
                    });
                }
            }
        }
        Ok(samples)
    }
}

#[async_trait]
impl<G: GatewayApi> Collector for RpcCollector<G> {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    async fn initialise(&self) -> Result<(), CollectorHealth> {
        let timeout = self.settings.rpc_timeout;
        let info = bounded("get_gateway_info", timeout, self.gateway.gateway_info())
            .await
            .map_err(|e| self.fail(e))?;
        if !version::gateway_version_supported(&info.version) {
            tracing::warn!(
                version = %info.version,
                minimum = %version::min_gateway_version(),
                "gateway is older than the minimum supported version"
            );
        }
        tracing::info!(
            server = self.gateway.server(),
            name = %info.name,
            version = %info.version,
            "connected to gateway"
        );
        self.core.set_gateway_info(info);

        let subsystems = bounded("list_subsystems", timeout, self.gateway.list_subsystems(None))
            .await
            .map_err(|e| self.fail(e))?;
        if subsystems.is_empty() {
            return Err(self.fail(GatewayError::NoSubsystems));
        }

        let mut locked = self.core.lock().await;
        if !subsystems.iter().any(|s| s.nqn == locked.subsystem) {
            let nqn = locked.subsystem.clone();
            return Err(self.fail(GatewayError::UnknownSubsystem { nqn }));
        }
        tracing::debug!(subsystems_count = subsystems.len(), "subsystems enumerated");
        locked.subsystems = subsystems;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn poll_once(&self) -> Result<(), CollectorHealth> {
        if !self.core.ready() {
            return Err(self.core.health());
        }
        let timeout = self.settings.rpc_timeout;
        let mut locked = self.core.lock().await;
        let subsystem = locked.subsystem.clone();

        let namespaces = bounded(
            "list_namespaces",
            timeout,
            self.gateway.list_namespaces(&subsystem),
        )
        .await
        .map_err(|e| self.fail(e))?;

        let (samples, subsystems, connections) = tokio::try_join!(
            self.fetch_io_stats(&subsystem, &namespaces),
            bounded("list_subsystems", timeout, self.gateway.list_subsystems(None)),
            bounded(
                "list_connections",
                timeout,
                self.gateway.list_connections(&subsystem)
            ),
        )
        .map_err(|e| self.fail(e))?;

        locked.apply_io_samples(samples);
        locked.namespaces = namespaces;
        locked.subsystems = subsystems;
        locked.connections = connections;
        locked.record_sample();
        tracing::debug!(
            subsystem = %subsystem,
            namespaces_count = locked.namespaces.len(),
            "poll cycle applied"
        );
        Ok(())
    }
}
