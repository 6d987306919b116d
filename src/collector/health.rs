// Health codes, and the single place gateway errors become CollectorHealth.

use crate::gateway::GatewayError;
use crate::models::CollectorHealth;

pub const UNAVAILABLE: i32 = 8;
pub const TIMEOUT: i32 = 9;
pub const RPC_STATUS: i32 = 10;
pub const REJECTED: i32 = 11;
pub const NO_SUBSYSTEMS: i32 = 12;
pub const UNKNOWN_SUBSYSTEM: i32 = 13;
pub const TASK_FAILED: i32 = 14;
pub const SIMULATED: i32 = 15;

pub fn code_for(err: &GatewayError) -> i32 {
    match err {
        GatewayError::Unavailable { .. } => UNAVAILABLE,
        GatewayError::Timeout { .. } => TIMEOUT,
        GatewayError::Status { .. } => RPC_STATUS,
        GatewayError::Rejected { .. } => REJECTED,
        GatewayError::NoSubsystems => NO_SUBSYSTEMS,
        GatewayError::UnknownSubsystem { .. } => UNKNOWN_SUBSYSTEM,
        GatewayError::TaskFailed { .. } => TASK_FAILED,
        GatewayError::Simulated { .. } => SIMULATED,
    }
}

pub fn health_from_error(err: &GatewayError) -> CollectorHealth {
    CollectorHealth::degraded(code_for(err), err.to_string())
}
