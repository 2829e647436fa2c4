mod adapters;
mod application;
mod config;
mod domain;
mod ports;

use std::future::Future;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{HostAdapter, HostConfig};
use application::{CaptureError, CaptureOptions, InventoryService};
use config::Config;

/// How long blocking work abandoned at a capture deadline may hold up exit
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> ExitCode {
    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hostinv: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging; stdout carries only the snapshot
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hostinv={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let outcome = match block_on_bounded(run(config), SHUTDOWN_GRACE) {
        Ok(result) => result,
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Drive `future` on a fresh runtime, then wait at most `grace` for
/// blocking tasks it abandoned. A read that missed its deadline may still
/// be stuck in a system call, and a plain runtime drop would wait for it.
fn block_on_bounded<F: Future>(future: F, grace: Duration) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    Ok(output)
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Starting hostinv v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let adapter = HostAdapter::new(HostConfig::new(config.sys_path.clone()));
    let service = InventoryService::new(
        Arc::new(adapter),
        CaptureOptions {
            probe_timeout: config.probe_timeout,
            process_limit: config.process_limit,
        },
    );

    let snapshot = match service.capture_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(CaptureError::SourceUnavailable { failures }) => {
            for failure in &failures {
                error!(source = %failure.source_id, error = %failure.cause, "probe failed");
            }
            return Err(CaptureError::SourceUnavailable { failures }.into());
        }
    };

    if !snapshot.is_complete() {
        warn!(sources = ?snapshot.unavailable_sources(), "partial snapshot");
    }

    let json = if config.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    stdout.flush()?;

    Ok(())
}
