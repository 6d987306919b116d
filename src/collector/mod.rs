// Collectors: one background poll loop per process feeding a lock-protected snapshot for readers.

pub mod health;
mod rpc;
mod shared;
mod synthetic;

pub use health::health_from_error;
pub use rpc::{RpcCollector, RpcSettings};
pub use shared::{CollectorCore, CollectorState, MAX_DELAY_SECS, MIN_SAMPLES, StateGuard};
pub use synthetic::{SyntheticCollector, SyntheticSettings};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::gateway::GatewayError;
use crate::models::CollectorHealth;

/// A data source for the namespace table. Readers only go through `core()`, so they cannot
/// tell which backend is active.
#[async_trait]
pub trait Collector: Send + Sync {
    fn core(&self) -> &CollectorCore;

    /// One-time setup. On failure health is degraded and `ready()` stays false for good.
    async fn initialise(&self) -> Result<(), CollectorHealth>;

    /// One poll cycle. Counters are only touched when every fetch of the cycle succeeded.
    async fn poll_once(&self) -> Result<(), CollectorHealth>;

    fn ready(&self) -> bool {
        self.core().ready()
    }

    fn samples_ready(&self) -> bool {
        self.core().samples_ready()
    }

    fn health(&self) -> CollectorHealth {
        self.core().health()
    }

    /// Polls every `delay_secs` until `shutdown` fires or a cycle fails. Returns the final health.
    async fn run(&self, shutdown: CancellationToken) -> CollectorHealth {
        let core = self.core();
        loop {
            if shutdown.is_cancelled() {
                tracing::info!("collector stopping");
                return core.health();
            }
            let started = Instant::now();
            if let Err(health) = self.poll_once().await {
                tracing::warn!(code = health.code, message = %health.message, "collector loop exiting");
                return health;
            }
            tracing::debug!(
                operation = "poll_cycle",
                elapsed_ms = started.elapsed().as_millis() as u64,
                "poll cycle complete"
            );

            let delay = Duration::from_secs(core.delay_secs().await);
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("collector stopping");
                    return core.health();
                }
                _ = tokio::time::sleep(delay.saturating_sub(started.elapsed())) => {}
            }
        }
    }
}

/// Runs the poll loop on its own task for the lifetime of `shutdown`.
/// A panicking loop degrades the collector instead of leaving it looking healthy.
pub fn spawn(
    collector: Arc<dyn Collector>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<CollectorHealth> {
    tokio::spawn(async move {
        let worker = Arc::clone(&collector);
        match tokio::spawn(async move { worker.run(shutdown).await }).await {
            Ok(health) => health,
            Err(e) => {
                let err = GatewayError::TaskFailed {
                    detail: e.to_string(),
                };
                collector.core().degrade(health_from_error(&err))
            }
        }
    })
}
