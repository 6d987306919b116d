// Collector health as seen by readers

use serde::{Deserialize, Serialize};

/// `code == 0` is healthy; any other code is terminal for the collector instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectorHealth {
    pub code: i32,
    pub message: String,
}

impl CollectorHealth {
    pub const OK: i32 = 0;

    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn degraded(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.code == Self::OK
    }
}

impl std::fmt::Display for CollectorHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_healthy() {
            write!(f, "healthy")
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}
