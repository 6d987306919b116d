// Command-line arguments. Values given here override the config file.

use clap::Parser;
use std::path::PathBuf;

use crate::collector::MAX_DELAY_SECS;
use crate::models::SortKey;
use crate::nqn::parse_nqn;

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    s.parse()
}

/// Live per-namespace IO statistics for one NVMe-oF gateway subsystem.
#[derive(Parser, Debug, Clone)]
#[command(name = "nvmeof-top", version, about)]
pub struct Args {
    /// Refresh interval in seconds, 1-3600 [default: 3]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=MAX_DELAY_SECS))]
    pub delay: Option<u64>,

    /// Generate synthetic data instead of polling a gateway
    #[arg(long)]
    pub synthetic: bool,

    /// NQN of the subsystem to monitor
    #[arg(short = 'n', long, value_parser = parse_nqn)]
    pub subsystem: String,

    /// Gateway server address
    #[arg(short = 'a', long, env = "SERVER_ADDR")]
    pub server_addr: Option<String>,

    /// Gateway control path port [default: 5500]
    #[arg(short = 'p', long, env = "SERVER_PORT")]
    pub server_port: Option<u16>,

    /// Prefix each batch of namespace statistics with a timestamp
    #[arg(long)]
    pub with_timestamp: bool,

    /// Omit column headings
    #[arg(long)]
    pub no_headings: bool,

    /// Number of iterations to print before exiting
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,

    /// Column heading to sort namespaces by (e.g. "r/s", "w_await")
    #[arg(short, long, default_value = "NSID", value_parser = parse_sort_key)]
    pub sort_key: SortKey,

    /// Sort in descending order
    #[arg(short, long)]
    pub reverse: bool,

    /// Emit one JSON object per iteration instead of a table
    #[arg(long)]
    pub json: bool,

    /// Configuration file path
    #[arg(long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,
}
