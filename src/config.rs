use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;
use crate::collector::{MAX_DELAY_SECS, RpcSettings, SyntheticSettings};

/// Read when neither --config nor CONFIG_FILE is given; may be absent.
pub const DEFAULT_CONFIG_FILE: &str = "nvmeof-top.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub collector: CollectorConfig,
    pub logging: LoggingConfig,
    pub synthetic: SyntheticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub addr: Option<String>,
    pub port: u16,
    /// Upper bound for each gateway RPC.
    pub rpc_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: None,
            port: 5500,
            rpc_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub delay_secs: u64,
    /// Max concurrent per-namespace IO stat calls in one poll cycle.
    pub fanout_limit: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            delay_secs: 3,
            fanout_limit: 32,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub namespaces: u32,
    pub reactor_cores: u32,
    pub seed: Option<u64>,
    pub fail_after_cycles: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let defaults = SyntheticSettings::default();
        Self {
            namespaces: defaults.namespaces,
            reactor_cores: defaults.reactor_cores,
            seed: defaults.seed,
            fail_after_cycles: defaults.fail_after_cycles,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or the default file when it exists, or built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Command-line values win over file values.
    pub fn apply_args(&mut self, args: &Args) -> anyhow::Result<()> {
        if let Some(addr) = &args.server_addr {
            self.gateway.addr = Some(addr.clone());
        }
        if let Some(port) = args.server_port {
            self.gateway.port = port;
        }
        if let Some(delay) = args.delay {
            self.collector.delay_secs = delay;
        }
        self.validate()
    }

    /// Empty or missing address means no gateway was configured.
    pub fn gateway_addr(&self) -> Option<&str> {
        self.gateway.addr.as_deref().filter(|a| !a.trim().is_empty())
    }

    pub fn rpc_settings(&self) -> RpcSettings {
        RpcSettings {
            rpc_timeout: Duration::from_millis(self.gateway.rpc_timeout_ms),
            fanout_limit: self.collector.fanout_limit,
        }
    }

    pub fn synthetic_settings(&self) -> SyntheticSettings {
        SyntheticSettings {
            namespaces: self.synthetic.namespaces,
            reactor_cores: self.synthetic.reactor_cores,
            seed: self.synthetic.seed,
            fail_after_cycles: self.synthetic.fail_after_cycles,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.gateway.port > 0,
            "gateway.port must be between 1 and 65535, got {}",
            self.gateway.port
        );
        anyhow::ensure!(
            self.gateway.rpc_timeout_ms > 0,
            "gateway.rpc_timeout_ms must be > 0, got {}",
            self.gateway.rpc_timeout_ms
        );
        anyhow::ensure!(
            (1..=MAX_DELAY_SECS).contains(&self.collector.delay_secs),
            "collector.delay_secs must be between 1 and {MAX_DELAY_SECS}, got {}",
            self.collector.delay_secs
        );
        anyhow::ensure!(
            self.collector.fanout_limit > 0,
            "collector.fanout_limit must be > 0, got {}",
            self.collector.fanout_limit
        );
        anyhow::ensure!(
            self.synthetic.namespaces > 0,
            "synthetic.namespaces must be > 0, got {}",
            self.synthetic.namespaces
        );
        Ok(())
    }
}
