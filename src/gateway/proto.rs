// Protobuf messages and the unary gRPC stub for the gateway service.
// Only the fields the collector reads are declared; prost skips the rest on decode.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetGatewayInfoReq {
    #[prost(string, optional, tag = "1")]
    pub cli_version: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GatewayInfoResp {
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, tag = "3")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListSubsystemsReq {
    #[prost(string, optional, tag = "1")]
    pub subsystem_nqn: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SubsystemCli {
    #[prost(string, tag = "1")]
    pub nqn: String,
    #[prost(uint32, tag = "9")]
    pub max_namespaces: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SubsystemsInfoCli {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub error_message: String,
    #[prost(message, repeated, tag = "3")]
    pub subsystems: Vec<SubsystemCli>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListNamespacesReq {
    #[prost(string, tag = "1")]
    pub subsystem: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamespaceCli {
    #[prost(uint32, tag = "1")]
    pub nsid: u32,
    #[prost(string, tag = "2")]
    pub bdev_name: String,
    #[prost(string, tag = "3")]
    pub rbd_image_name: String,
    #[prost(string, tag = "4")]
    pub rbd_pool_name: String,
    #[prost(uint32, tag = "5")]
    pub load_balancing_group: u32,
    #[prost(uint64, tag = "9")]
    pub rw_ios_per_second: u64,
    #[prost(uint64, tag = "10")]
    pub rw_mbytes_per_second: u64,
    #[prost(uint64, tag = "11")]
    pub r_mbytes_per_second: u64,
    #[prost(uint64, tag = "12")]
    pub w_mbytes_per_second: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamespacesInfo {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub error_message: String,
    #[prost(message, repeated, tag = "4")]
    pub namespaces: Vec<NamespaceCli>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamespaceGetIoStatsReq {
    #[prost(string, tag = "1")]
    pub subsystem_nqn: String,
    #[prost(uint32, optional, tag = "2")]
    pub nsid: Option<u32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NamespaceIoStatsInfo {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub error_message: String,
    #[prost(uint64, tag = "7")]
    pub tick_rate: u64,
    #[prost(uint64, tag = "9")]
    pub bytes_read: u64,
    #[prost(uint64, tag = "10")]
    pub num_read_ops: u64,
    #[prost(uint64, tag = "11")]
    pub bytes_written: u64,
    #[prost(uint64, tag = "12")]
    pub num_write_ops: u64,
    #[prost(uint64, tag = "15")]
    pub read_latency_ticks: u64,
    #[prost(uint64, tag = "18")]
    pub write_latency_ticks: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListConnectionsReq {
    #[prost(string, tag = "1")]
    pub subsystem: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Connection {
    #[prost(string, tag = "1")]
    pub nqn: String,
    #[prost(string, tag = "2")]
    pub traddr: String,
    #[prost(uint32, tag = "3")]
    pub trsvcid: u32,
    #[prost(bool, tag = "6")]
    pub connected: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ConnectionsInfo {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub error_message: String,
    #[prost(message, repeated, tag = "4")]
    pub connections: Vec<Connection>,
}

pub const GET_GATEWAY_INFO: &str = "/Gateway/get_gateway_info";
pub const LIST_SUBSYSTEMS: &str = "/Gateway/list_subsystems";
pub const LIST_NAMESPACES: &str = "/Gateway/list_namespaces";
pub const NAMESPACE_GET_IO_STATS: &str = "/Gateway/namespace_get_io_stats";
pub const LIST_CONNECTIONS: &str = "/Gateway/list_connections";

/// Thin unary client over a shared channel. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct GatewayStub {
    inner: tonic::client::Grpc<Channel>,
}

impl GatewayStub {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn unary<Req, Resp>(
        &mut self,
        path: &'static str,
        request: Req,
    ) -> Result<Resp, tonic::Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| tonic::Status::unavailable(format!("service was not ready: {e}")))?;
        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        let response = self
            .inner
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }
}
