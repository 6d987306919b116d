// Domain models: one DTO per gateway response, plus what the collector hands to readers

mod gateway;
mod health;
mod row;
mod snapshot;

pub use gateway::{
    ConnectionInfo, GatewayInfo, IoStatsSample, Namespace, QosLimits, SubsystemSummary,
};
pub use health::CollectorHealth;
pub use row::{NamespaceRow, SortKey};
pub use snapshot::CollectorSnapshot;
