// Synthetic collector: plausible, monotonically growing counters without a gateway.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use super::health::health_from_error;
use super::shared::CollectorCore;
use super::Collector;
use crate::gateway::GatewayError;
use crate::models::{
    CollectorHealth, ConnectionInfo, GatewayInfo, IoStatsSample, Namespace, QosLimits,
    SubsystemSummary,
};

const TICK_RATE: u64 = 1_000_000;
const EXTRA_SUBSYSTEMS: u32 = 2;
const MAX_NAMESPACES: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSettings {
    pub namespaces: u32,
    pub reactor_cores: u32,
    /// Fixed seed for reproducible output.
    pub seed: Option<u64>,
    /// Degrade after this many successful cycles. `Some(0)` fails `initialise`.
    pub fail_after_cycles: Option<u64>,
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            namespaces: 8,
            reactor_cores: 4,
            seed: None,
            fail_after_cycles: None,
        }
    }
}

struct Generator {
    rng: fastrand::Rng,
    counters: HashMap<String, IoStatsSample>,
    cycles: u64,
}

impl Generator {
    /// Advances one bdev's counters by a random, non-negative amount.
    fn advance(&mut self, bdev: &str, delay_secs: u64) -> IoStatsSample {
        let rng = &mut self.rng;
        let reads = rng.u64(0..=2_000).saturating_mul(delay_secs);
        let writes = rng.u64(0..=1_000).saturating_mul(delay_secs);
        let read_size = 4096 * rng.u64(1..=32);
        let write_size = 4096 * rng.u64(1..=64);
        let read_wait = rng.u64(50..=2_000);
        let write_wait = rng.u64(100..=5_000);

        // Counters pin at u64::MAX rather than wrap; rates then read as zero.
        let c = self.counters.entry(bdev.to_string()).or_default();
        c.tick_rate = TICK_RATE;
        c.num_read_ops = c.num_read_ops.saturating_add(reads);
        c.bytes_read = c.bytes_read.saturating_add(reads.saturating_mul(read_size));
        c.read_latency_ticks = c
            .read_latency_ticks
            .saturating_add(reads.saturating_mul(read_wait));
        c.num_write_ops = c.num_write_ops.saturating_add(writes);
        c.bytes_written = c
            .bytes_written
            .saturating_add(writes.saturating_mul(write_size));
        c.write_latency_ticks = c
            .write_latency_ticks
            .saturating_add(writes.saturating_mul(write_wait));
        *c
    }
}

pub struct SyntheticCollector {
    core: CollectorCore,
    settings: SyntheticSettings,
    generator: Mutex<Generator>,
}

impl SyntheticCollector {
    pub fn new(subsystem: impl Into<String>, delay_secs: u64, settings: SyntheticSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            core: CollectorCore::new(subsystem, delay_secs, true),
            settings,
            generator: Mutex::new(Generator {
                rng,
                counters: HashMap::new(),
                cycles: 0,
            }),
        }
    }

    fn fail(&self, err: GatewayError) -> CollectorHealth {
        self.core.degrade(health_from_error(&err))
    }

    fn namespaces(&self) -> Vec<Namespace> {
        (1..=self.settings.namespaces)
            .map(|nsid| Namespace {
                nsid,
                bdev_name: format!("bdev_synthetic_{nsid:04}"),
                rbd_pool_name: "rbd".to_string(),
                rbd_image_name: format!("image-{nsid:04}"),
                load_balancing_group: (nsid - 1) % 2 + 1,
                qos: if nsid % 3 == 0 {
                    QosLimits {
                        rw_ios_per_second: 10_000,
                        ..Default::default()
                    }
                } else {
                    QosLimits::default()
                },
            })
            .collect()
    }
}

#[async_trait]
impl Collector for SyntheticCollector {
    fn core(&self) -> &CollectorCore {
        &self.core
    }

    async fn initialise(&self) -> Result<(), CollectorHealth> {
        if self.settings.fail_after_cycles == Some(0) {
            return Err(self.fail(GatewayError::Simulated { cycles: 0 }));
        }
        self.core.set_gateway_info(GatewayInfo {
            version: crate::version::VERSION.to_string(),
            name: "synthetic".to_string(),
        });

        let mut locked = self.core.lock().await;
        let mut subsystems = vec![SubsystemSummary {
            nqn: locked.subsystem.clone(),
            max_namespaces: MAX_NAMESPACES,
        }];
        subsystems.extend((1..=EXTRA_SUBSYSTEMS).map(|n| SubsystemSummary {
            nqn: format!("nqn.2016-06.io.spdk:synthetic{n}"),
            max_namespaces: MAX_NAMESPACES,
        }));
        locked.subsystems = subsystems;
        tracing::info!(
            namespaces = self.settings.namespaces,
            reactor_cores = self.settings.reactor_cores,
            "synthetic collector initialised"
        );
        Ok(())
    }

    async fn poll_once(&self) -> Result<(), CollectorHealth> {
        if !self.core.ready() {
            return Err(self.core.health());
        }
        let mut locked = self.core.lock().await;

        let cycles = self.generator.lock().cycles;
        if let Some(limit) = self.settings.fail_after_cycles
            && cycles >= limit
        {
            return Err(self.fail(GatewayError::Simulated { cycles }));
        }

        let namespaces = self.namespaces();
        let delay_secs = locked.delay_secs;
        let (samples, connections, cpu_stats) = {
            let mut generator = self.generator.lock();
            let samples: Vec<(String, IoStatsSample)> = namespaces
                .iter()
                .map(|ns| (ns.bdev_name.clone(), generator.advance(&ns.bdev_name, delay_secs)))
                .collect();
            let connections: Vec<ConnectionInfo> = (1..=4u32)
                .map(|host| ConnectionInfo {
                    client_nqn: format!("nqn.2014-08.org.nvmexpress:uuid:host-{host}"),
                    address: format!("10.0.0.{host}:4420"),
                    connected: generator.rng.bool(),
                })
                .collect();
            let cpu_stats: BTreeMap<String, f64> = (0..self.settings.reactor_cores)
                .map(|core| {
                    (
                        format!("reactor_{core}"),
                        generator.rng.f64() * 100.0,
                    )
                })
                .collect();
            generator.cycles += 1;
            (samples, connections, cpu_stats)
        };

        locked.apply_io_samples(samples);
        locked.namespaces = namespaces;
        locked.connections = connections;
        locked.cpu_stats = cpu_stats;
        locked.record_sample();
        Ok(())
    }
}
