// Remote gateway access: one async method per RPC, each returning an explicit result-or-error.

mod client;
mod proto;

pub use client::GrpcGateway;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::{ConnectionInfo, GatewayInfo, IoStatsSample, Namespace, SubsystemSummary};

/// Every way a gateway call (or the collector work wrapped around it) can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("RPC endpoint unavailable at {server}: {detail}")]
    Unavailable { server: String, detail: String },
    #[error("{method} timed out after {after:?}")]
    Timeout {
        method: &'static str,
        after: Duration,
    },
    #[error("{method} failed with {code}: {message}")]
    Status {
        method: &'static str,
        code: String,
        message: String,
    },
    #[error("{method} rejected by gateway (status {status}): {message}")]
    Rejected {
        method: &'static str,
        status: i32,
        message: String,
    },
    #[error("no subsystems are defined on the gateway")]
    NoSubsystems,
    #[error("subsystem {nqn} is not defined to this gateway")]
    UnknownSubsystem { nqn: String },
    #[error("collector task failed: {detail}")]
    TaskFailed { detail: String },
    #[error("simulated failure after {cycles} poll cycles")]
    Simulated { cycles: u64 },
}

/// Gateway operations consumed by the collector.
#[async_trait]
pub trait GatewayApi: Send + Sync + 'static {
    /// "host:port" of the remote endpoint, for messages.
    fn server(&self) -> &str;

    async fn gateway_info(&self) -> Result<GatewayInfo, GatewayError>;

    /// All subsystems on the gateway, or only `filter` when given.
    async fn list_subsystems(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<SubsystemSummary>, GatewayError>;

    async fn list_namespaces(&self, subsystem: &str) -> Result<Vec<Namespace>, GatewayError>;

    async fn namespace_io_stats(
        &self,
        subsystem: &str,
        nsid: u32,
    ) -> Result<IoStatsSample, GatewayError>;

    async fn list_connections(&self, subsystem: &str)
    -> Result<Vec<ConnectionInfo>, GatewayError>;
}

/// Bounds a gateway call with `after`; expiry is reported like any other failure.
pub async fn bounded<T, F>(method: &'static str, after: Duration, call: F) -> Result<T, GatewayError>
where
    F: std::future::Future<Output = Result<T, GatewayError>>,
{
    tracing::debug!(operation = method, "calling gateway");
    match tokio::time::timeout(after, call).await {
        Ok(Ok(value)) => {
            tracing::debug!(operation = method, "gateway call successful");
            Ok(value)
        }
        Ok(Err(e)) => {
            tracing::error!(operation = method, error = %e, "gateway call failed");
            Err(e)
        }
        Err(_) => {
            let e = GatewayError::Timeout { method, after };
            tracing::error!(operation = method, error = %e, "gateway call timed out");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bounded_maps_expiry_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<u32, GatewayError>(1)
        };
        let err = bounded("list_namespaces", Duration::from_secs(5), slow)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Timeout {
                method: "list_namespaces",
                after: Duration::from_secs(5)
            }
        );
    }

    #[tokio::test]
    async fn bounded_passes_through_results() {
        let ok = bounded("get_gateway_info", Duration::from_secs(1), async {
            Ok::<_, GatewayError>("1.2.0")
        })
        .await;
        assert_eq!(ok, Ok("1.2.0"));
    }
}
