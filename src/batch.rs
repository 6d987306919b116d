// Batch mode: prints a namespace table (or a JSON line) every `delay` seconds.

use chrono::{DateTime, Local};
use std::io::Write;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::collector::Collector;
use crate::models::{CollectorHealth, CollectorSnapshot, NamespaceRow, SortKey};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub delay_secs: u64,
    pub with_timestamp: bool,
    pub no_headings: bool,
    /// Stop after this many printed snapshots.
    pub count: Option<u64>,
    pub sort_key: SortKey,
    pub descending: bool,
    pub json: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay_secs: 3,
            with_timestamp: false,
            no_headings: false,
            count: None,
            sort_key: SortKey::Nsid,
            descending: false,
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// `count` snapshots were printed.
    Completed,
    /// Shutdown was requested.
    Stopped,
    /// The collector stopped being ready; its health says why.
    Degraded(CollectorHealth),
}

pub async fn run<W: Write>(
    collector: &dyn Collector,
    opts: &BatchOptions,
    out: &mut W,
    shutdown: &CancellationToken,
) -> anyhow::Result<BatchOutcome> {
    tracing::info!(sort_key = %opts.sort_key, json = opts.json, "running in batch mode");
    writeln!(out, "waiting for samples...")?;
    out.flush()?;

    let delay = Duration::from_secs(opts.delay_secs.max(1));
    let mut printed: u64 = 0;
    loop {
        if shutdown.is_cancelled() {
            return Ok(BatchOutcome::Stopped);
        }
        if !collector.ready() {
            return Ok(BatchOutcome::Degraded(collector.health()));
        }
        if collector.samples_ready() {
            let snapshot = collector
                .core()
                .snapshot(opts.sort_key, opts.descending)
                .await;
            if snapshot.samples_ready {
                if opts.json {
                    render_json(&snapshot, out)?;
                } else {
                    render_text(&snapshot, opts, out)?;
                }
                out.flush()?;
                printed += 1;
                if opts.count.is_some_and(|c| printed >= c) {
                    return Ok(BatchOutcome::Completed);
                }
            }
        }

        tokio::select! {
            _ = shutdown.cancelled() => return Ok(BatchOutcome::Stopped),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

const HEADINGS: [&str; 12] = [
    "NSID",
    "RBD pool/image",
    "r/s",
    "rMB/s",
    "r_await",
    "rareq-sz",
    "w/s",
    "wMB/s",
    "w_await",
    "wareq-sz",
    "LBGrp",
    "QoS",
];

fn table_line<S: AsRef<str>>(c: &[S; 12]) -> String {
    format!(
        "{:>4}  {:<32}    {:>6}   {:>6}  {:>7}  {:>8}  {:>6}  {:>6}  {:>7}  {:>8}  {:^5}   {:>3}",
        c[0].as_ref(),
        c[1].as_ref(),
        c[2].as_ref(),
        c[3].as_ref(),
        c[4].as_ref(),
        c[5].as_ref(),
        c[6].as_ref(),
        c[7].as_ref(),
        c[8].as_ref(),
        c[9].as_ref(),
        c[10].as_ref(),
        c[11].as_ref(),
    )
}

fn row_columns(row: &NamespaceRow) -> [String; 12] {
    let (r, w) = (&row.rates.read, &row.rates.write);
    [
        row.nsid.to_string(),
        row.rbd_image.clone(),
        (r.ops_per_sec as i64).to_string(),
        format!("{:3.2}", row.read_mib_per_sec()),
        format!("{:3.2}", r.avg_wait_ms),
        format!("{:4.2}", r.avg_request_kib),
        (w.ops_per_sec as i64).to_string(),
        format!("{:3.2}", row.write_mib_per_sec()),
        format!("{:3.2}", w.avg_wait_ms),
        format!("{:4.2}", w.avg_request_kib),
        lb_group(row.load_balancing_group),
        if row.qos_enabled { "Yes" } else { "No" }.to_string(),
    ]
}

/// Group 0 means load balancing is not in use.
fn lb_group(group: u32) -> String {
    if group == 0 {
        "N/A".to_string()
    } else {
        group.to_string()
    }
}

fn local_time(timestamp: Option<u64>) -> String {
    let when = timestamp
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.with_timezone(&Local))
        .unwrap_or_else(Local::now);
    when.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn render_text<W: Write>(
    snapshot: &CollectorSnapshot,
    opts: &BatchOptions,
    out: &mut W,
) -> std::io::Result<()> {
    if opts.with_timestamp {
        writeln!(out, "{}", local_time(snapshot.timestamp))?;
    }
    if !opts.no_headings {
        writeln!(out, "{}", table_line(&HEADINGS))?;
    }
    if snapshot.rows.is_empty() {
        writeln!(out, "<no namespaces defined>")?;
    }
    for row in &snapshot.rows {
        writeln!(out, "{}", table_line(&row_columns(row)))?;
    }
    Ok(())
}

/// One JSON object per line.
pub fn render_json<W: Write>(snapshot: &CollectorSnapshot, out: &mut W) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, snapshot)?;
    writeln!(out)
}
