// Cumulative gateway counters and the per-interval rates derived from them.

use serde::Serialize;

use crate::models::IoStatsSample;

/// Current and previous value of one cumulative counter.
///
/// The first `update` leaves `previous` at 0, so `rate` returns the raw
/// cumulative value over the interval until a second update has happened.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateCounter {
    current: f64,
    previous: f64,
}

impl RateCounter {
    pub fn update(&mut self, value: f64) {
        self.previous = self.current;
        self.current = value;
    }

    /// Per-second change over `interval` seconds (always > 0; the poll delay is at least 1).
    pub fn rate(&self, interval: f64) -> f64 {
        debug_assert!(interval > 0.0, "rate interval must be positive");
        (self.current - self.previous) / interval
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }
}

/// Rates for one IO direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionRates {
    pub ops_per_sec: f64,
    pub bytes_per_sec: f64,
    /// Seconds spent servicing IO per second of wall time.
    pub busy_secs_per_sec: f64,
    /// Average request size in KiB; 0.0 when there were no ops.
    pub avg_request_kib: f64,
    /// Average wait per request in milliseconds; 0.0 when there were no ops.
    pub avg_wait_ms: f64,
}

/// Derived metrics for one bdev. Computed on demand, never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IoRates {
    pub read: DirectionRates,
    pub write: DirectionRates,
    pub total_ops_per_sec: f64,
    pub total_bytes_per_sec: f64,
}

/// The six counters tracked for one backing device.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    bdev: String,
    pub read_ops: RateCounter,
    pub read_bytes: RateCounter,
    pub read_secs: RateCounter,
    pub write_ops: RateCounter,
    pub write_bytes: RateCounter,
    pub write_secs: RateCounter,
}

impl PerformanceStats {
    pub fn new(bdev: impl Into<String>) -> Self {
        Self {
            bdev: bdev.into(),
            read_ops: RateCounter::default(),
            read_bytes: RateCounter::default(),
            read_secs: RateCounter::default(),
            write_ops: RateCounter::default(),
            write_bytes: RateCounter::default(),
            write_secs: RateCounter::default(),
        }
    }

    pub fn bdev(&self) -> &str {
        &self.bdev
    }

    /// Shift every counter by one sample. Latency ticks become seconds via the tick rate.
    pub fn update(&mut self, sample: &IoStatsSample) {
        self.read_ops.update(sample.num_read_ops as f64);
        self.read_bytes.update(sample.bytes_read as f64);
        self.read_secs.update(sample.read_latency_secs());
        self.write_ops.update(sample.num_write_ops as f64);
        self.write_bytes.update(sample.bytes_written as f64);
        self.write_secs.update(sample.write_latency_secs());
    }

    pub fn calculate(&self, delay: f64) -> IoRates {
        let read = direction_rates(&self.read_ops, &self.read_bytes, &self.read_secs, delay);
        let write = direction_rates(&self.write_ops, &self.write_bytes, &self.write_secs, delay);
        IoRates {
            read,
            write,
            total_ops_per_sec: read.ops_per_sec + write.ops_per_sec,
            total_bytes_per_sec: read.bytes_per_sec + write.bytes_per_sec,
        }
    }
}

fn direction_rates(
    ops: &RateCounter,
    bytes: &RateCounter,
    secs: &RateCounter,
    delay: f64,
) -> DirectionRates {
    let ops_per_sec = ops.rate(delay);
    let bytes_per_sec = bytes.rate(delay);
    let busy_secs_per_sec = secs.rate(delay);
    let (avg_request_kib, avg_wait_ms) = if ops_per_sec > 0.0 {
        (
            bytes_per_sec / ops_per_sec / 1024.0,
            busy_secs_per_sec / ops_per_sec * 1000.0,
        )
    } else {
        (0.0, 0.0)
    };
    DirectionRates {
        ops_per_sec,
        bytes_per_sec,
        busy_secs_per_sec,
        avg_request_kib,
        avg_wait_ms,
    }
}
