//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ForwarderConfig;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_forwarder(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        url = %config.client.url,
        sink = ?config.client.sink,
        dynamic_hosts = config.has_dynamic_hosts(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        config,
        input: args.input.clone(),
        clusters: args.clusters.clone(),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Forwarding failed")?;

    info!(
        records_read = stats.records_read,
        records_forwarded = stats.records_forwarded,
        duration_secs = stats.duration.as_secs_f64(),
        "Forwarder finished"
    );
    stats.print_summary();

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &ForwarderConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Default client:");
    println!("  URL: {}", config.client.url);
    println!("  Sink: {:?}", config.client.sink);
    println!("  Queue: {}", config.client.queue_name);

    if config.has_dynamic_hosts() {
        println!("\nDynamic routing:");
        println!("  Host pattern: {}", config.plugin.dynamic_host_regex);
        println!(
            "  Cluster URL: {}<cluster>{}",
            config.controller.dynamic_host_prefix, config.controller.dynamic_host_suffix
        );
    }

    println!();
}
