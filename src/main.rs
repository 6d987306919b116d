use anyhow::Result;
use clap::Parser;
use nvmeof_top::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use batch::{BatchOptions, BatchOutcome};
use collector::{Collector, RpcCollector, SyntheticCollector};
use gateway::GrpcGateway;

/// No gateway address could be determined from args, env or config.
const EXIT_NO_GATEWAY: u8 = 4;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Args::parse();
    let mut app_config = config::AppConfig::load(args.config.as_deref())?;
    app_config.apply_args(&args)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&app_config.logging.level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(package = version::NAME, version = version::VERSION, subsystem = %args.subsystem, "starting");

    let delay_secs = app_config.collector.delay_secs;
    let collector: Arc<dyn Collector> = if args.synthetic {
        Arc::new(SyntheticCollector::new(
            args.subsystem.clone(),
            delay_secs,
            app_config.synthetic_settings(),
        ))
    } else {
        let Some(addr) = app_config.gateway_addr() else {
            println!("Unable to determine the gateway address. Use --server-addr or SERVER_ADDR");
            return Ok(ExitCode::from(EXIT_NO_GATEWAY));
        };
        let settings = app_config.rpc_settings();
        let gateway = GrpcGateway::connect_lazy(addr, app_config.gateway.port, settings.rpc_timeout)
            .map_err(|e| anyhow::anyhow!("gateway: {}", e))?;
        Arc::new(RpcCollector::new(
            gateway,
            args.subsystem.clone(),
            delay_secs,
            settings,
        ))
    };

    if let Err(health) = collector.initialise().await {
        tracing::error!(code = health.code, message = %health.message, "collector failed to initialise");
        println!("{}", health.message);
        return Ok(exit_code(health.code));
    }

    let shutdown = CancellationToken::new();
    let poller = collector::spawn(Arc::clone(&collector), shutdown.clone());

    let opts = BatchOptions {
        delay_secs,
        with_timestamp: args.with_timestamp,
        no_headings: args.no_headings,
        count: args.count,
        sort_key: args.sort_key,
        descending: args.reverse,
        json: args.json,
    };
    let mut stdout = std::io::stdout().lock();
    let outcome = tokio::select! {
        outcome = batch::run(collector.as_ref(), &opts, &mut stdout, &shutdown) => outcome?,
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            BatchOutcome::Stopped
        }
    };
    drop(stdout);

    shutdown.cancel();
    match tokio::time::timeout(Duration::from_secs(delay_secs.saturating_add(1)), poller).await {
        Ok(Ok(health)) => tracing::debug!(%health, "collector finished"),
        Ok(Err(e)) => tracing::warn!(error = %e, "collector task failed"),
        Err(_) => tracing::warn!("collector did not stop in time"),
    }

    match outcome {
        BatchOutcome::Degraded(health) => {
            tracing::error!(code = health.code, message = %health.message, "collector has hit a problem");
            println!("{}", health.message);
            Ok(exit_code(health.code))
        }
        BatchOutcome::Completed | BatchOutcome::Stopped => {
            println!("\nnvmeof-top stopped.");
            Ok(ExitCode::SUCCESS)
        }
    }
}
