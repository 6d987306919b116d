// gRPC-backed GatewayApi: converts protobuf responses into the crate's DTOs.

use async_trait::async_trait;
use std::time::Duration;
use tonic::transport::Endpoint;

use super::proto::{self, GatewayStub};
use super::{GatewayApi, GatewayError};
use crate::models::{
    ConnectionInfo, GatewayInfo, IoStatsSample, Namespace, QosLimits, SubsystemSummary,
};

pub struct GrpcGateway {
    server: String,
    stub: GatewayStub,
}

impl GrpcGateway {
    /// Builds an insecure channel to `addr:port`. The connection is only attempted on the
    /// first call, so an unreachable gateway shows up as `Unavailable` from `gateway_info`.
    pub fn connect_lazy(
        addr: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let server = server_authority(addr, port);
        let endpoint = Endpoint::from_shared(format!("http://{server}")).map_err(|e| {
            GatewayError::Unavailable {
                server: server.clone(),
                detail: e.to_string(),
            }
        })?;
        let channel = endpoint.connect_timeout(connect_timeout).connect_lazy();
        Ok(Self {
            server,
            stub: GatewayStub::new(channel),
        })
    }

    fn map_status(&self, method: &'static str, status: tonic::Status) -> GatewayError {
        match status.code() {
            tonic::Code::Unavailable => GatewayError::Unavailable {
                server: self.server.clone(),
                detail: status.message().to_string(),
            },
            code => GatewayError::Status {
                method,
                code: format!("{code:?}"),
                message: status.message().to_string(),
            },
        }
    }

    async fn call<Req, Resp>(
        &self,
        method: &'static str,
        path: &'static str,
        request: Req,
    ) -> Result<Resp, GatewayError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut stub = self.stub.clone();
        stub.unary(path, request)
            .await
            .map_err(|s| self.map_status(method, s))
    }
}

/// "host:port", bracketing bare IPv6 literals.
fn server_authority(addr: &str, port: u16) -> String {
    if addr.contains(':') && !addr.starts_with('[') {
        format!("[{addr}]:{port}")
    } else {
        format!("{addr}:{port}")
    }
}

fn check_status(method: &'static str, status: i32, message: String) -> Result<(), GatewayError> {
    if status == 0 {
        Ok(())
    } else {
        Err(GatewayError::Rejected {
            method,
            status,
            message,
        })
    }
}

#[async_trait]
impl GatewayApi for GrpcGateway {
    fn server(&self) -> &str {
        &self.server
    }

    async fn gateway_info(&self) -> Result<GatewayInfo, GatewayError> {
        let resp: proto::GatewayInfoResp = self
            .call(
                "get_gateway_info",
                proto::GET_GATEWAY_INFO,
                proto::GetGatewayInfoReq { cli_version: None },
            )
            .await?;
        Ok(GatewayInfo {
            version: resp.version,
            name: resp.name,
        })
    }

    async fn list_subsystems(
        &self,
        filter: Option<&str>,
    ) -> Result<Vec<SubsystemSummary>, GatewayError> {
        let resp: proto::SubsystemsInfoCli = self
            .call(
                "list_subsystems",
                proto::LIST_SUBSYSTEMS,
                proto::ListSubsystemsReq {
                    subsystem_nqn: filter.map(str::to_string),
                },
            )
            .await?;
        check_status("list_subsystems", resp.status, resp.error_message)?;
        Ok(resp
            .subsystems
            .into_iter()
            .map(|s| SubsystemSummary {
                nqn: s.nqn,
                max_namespaces: s.max_namespaces,
            })
            .collect())
    }

    async fn list_namespaces(&self, subsystem: &str) -> Result<Vec<Namespace>, GatewayError> {
        let resp: proto::NamespacesInfo = self
            .call(
                "list_namespaces",
                proto::LIST_NAMESPACES,
                proto::ListNamespacesReq {
                    subsystem: subsystem.to_string(),
                },
            )
            .await?;
        check_status("list_namespaces", resp.status, resp.error_message)?;
        Ok(resp
            .namespaces
            .into_iter()
            .map(|ns| Namespace {
                nsid: ns.nsid,
                bdev_name: ns.bdev_name,
                rbd_pool_name: ns.rbd_pool_name,
                rbd_image_name: ns.rbd_image_name,
                load_balancing_group: ns.load_balancing_group,
                qos: QosLimits {
                    rw_ios_per_second: ns.rw_ios_per_second,
                    rw_mbytes_per_second: ns.rw_mbytes_per_second,
                    r_mbytes_per_second: ns.r_mbytes_per_second,
                    w_mbytes_per_second: ns.w_mbytes_per_second,
                },
            })
            .collect())
    }

    async fn namespace_io_stats(
        &self,
        subsystem: &str,
        nsid: u32,
    ) -> Result<IoStatsSample, GatewayError> {
        let resp: proto::NamespaceIoStatsInfo = self
            .call(
                "namespace_get_io_stats",
                proto::NAMESPACE_GET_IO_STATS,
                proto::NamespaceGetIoStatsReq {
                    subsystem_nqn: subsystem.to_string(),
                    nsid: Some(nsid),
                },
            )
            .await?;
        check_status("namespace_get_io_stats", resp.status, resp.error_message)?;
        Ok(IoStatsSample {
            num_read_ops: resp.num_read_ops,
            bytes_read: resp.bytes_read,
            read_latency_ticks: resp.read_latency_ticks,
            num_write_ops: resp.num_write_ops,
            bytes_written: resp.bytes_written,
            write_latency_ticks: resp.write_latency_ticks,
            tick_rate: resp.tick_rate,
        })
    }

    async fn list_connections(
        &self,
        subsystem: &str,
    ) -> Result<Vec<ConnectionInfo>, GatewayError> {
        let resp: proto::ConnectionsInfo = self
            .call(
                "list_connections",
                proto::LIST_CONNECTIONS,
                proto::ListConnectionsReq {
                    subsystem: subsystem.to_string(),
                },
            )
            .await?;
        check_status("list_connections", resp.status, resp.error_message)?;
        Ok(resp
            .connections
            .into_iter()
            .map(|c| ConnectionInfo {
                client_nqn: c.nqn,
                address: if c.trsvcid > 0 {
                    format!("{}:{}", c.traddr, c.trsvcid)
                } else {
                    c.traddr
                },
                connected: c.connected,
            })
            .collect())
    }
}
