//! edgetier Binary Entry Point
//!
//! Command-line front end over the edgetier library: migration, edge-first
//! queries, aggregate comparison and the benchmark harness. Results are
//! printed to stdout as JSON; logs go to stderr.

use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use edgetier::bench::{DEFAULT_INGEST_BATCH, run_bench};
use edgetier::config::{AppConfig, parse_interval};
use edgetier::{
    Aggregate, PartitionManager, QuerySpec, RowStore, StorageBuilder, StorageHandles,
    compare_aggregate, resolve,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// edgetier - Two-Tier Time-Series Store
#[derive(Parser, Debug)]
#[command(name = "edgetier", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "EDGETIER_CONFIG"
    )]
    config: String,

    /// Edge database URL (overrides config file)
    #[arg(long, env = "EDGETIER_EDGE_DSN")]
    edge_dsn: Option<String>,

    /// Cloud database URL (overrides config file)
    #[arg(long, env = "EDGETIER_CLOUD_DSN")]
    cloud_dsn: Option<String>,

    /// Rows kept in the edge tier (overrides config file)
    #[arg(long, env = "EDGETIER_RETENTION_ROWS")]
    retention_rows: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Move edge rows beyond the retention threshold to the cloud tier
    Migrate,

    /// Migrate on a fixed interval until Ctrl+C
    Watch {
        /// Migration interval, e.g. "30s" (overrides partition.interval)
        #[arg(long, value_parser = parse_interval)]
        interval: Option<Duration>,
    },

    /// Resolve a read query, edge first
    Query {
        /// Raw SELECT returning StartDate, Value_kWh, day_of_week, notes
        #[arg(long, conflicts_with_all = ["from", "to", "day_of_week"])]
        sql: Option<String>,

        /// Inclusive lower StartDate bound
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Inclusive upper StartDate bound
        #[arg(long, requires = "from")]
        to: Option<String>,

        /// Day of week, 0 (Monday) to 6 (Sunday)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=6), conflicts_with = "from")]
        day_of_week: Option<u8>,
    },

    /// Compute an aggregate of Value_kWh on each tier
    Compare {
        /// mean, sum, min, max or count
        #[arg(long, default_value = "mean")]
        aggregate: Aggregate,
    },

    /// Show row counts for both tiers
    Stats,

    /// Ingest synthetic readings, then time migrate, resolve and compare
    Bench {
        /// Synthetic rows to ingest into the edge tier
        #[arg(long, default_value_t = 12_050)]
        rows: u64,

        /// Rows per ingest transaction
        #[arg(long, default_value_t = DEFAULT_INGEST_BATCH)]
        batch_size: usize,
    },
}

#[derive(Debug, Serialize)]
struct TierStats {
    edge_rows: u64,
    cloud_rows: u64,
    total_rows: u64,
    retention_rows: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,edgetier=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file, falling back to defaults
    let mut config = if Path::new(&cli.config).exists() {
        tracing::info!("Loading configuration from: {}", cli.config);
        AppConfig::load(&cli.config)?
    } else {
        tracing::warn!("Config file {} not found, using defaults", cli.config);
        AppConfig::default()
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(dsn) = cli.edge_dsn {
        config.edge.dsn = dsn;
    }
    if let Some(dsn) = cli.cloud_dsn {
        config.cloud.dsn = dsn;
    }
    if let Some(rows) = cli.retention_rows {
        config.partition.retention_rows = rows;
    }
    config.validate()?;

    let edge_url = config.edge.connection_url()?;
    let cloud_url = config.cloud.connection_url()?;
    tracing::info!(
        "Edge: {}, Cloud: {}, retention: {} rows",
        edge_url,
        cloud_url,
        config.partition.retention_rows,
    );

    let handles = StorageBuilder::new(edge_url, cloud_url)
        .edge_settings(config.edge.pool_settings())
        .cloud_settings(config.cloud.pool_settings())
        .build()
        .await?;
    let manager = PartitionManager::new(config.partition.retention_rows);

    let result = run(cli.command, &config, &handles, &manager).await;

    handles.close().await;
    result
}

async fn run(
    command: Command,
    config: &AppConfig,
    handles: &StorageHandles,
    manager: &PartitionManager,
) -> Result<(), Box<dyn std::error::Error>> {
    let (edge, cloud) = (&handles.edge, &handles.cloud);

    match command {
        Command::Migrate => {
            let report = manager.migrate(edge, cloud).await?;
            print_json(&report)?;
        }
        Command::Watch { interval } => {
            let interval = interval.or(config.partition.interval).ok_or(
                "no migration interval: pass --interval or set partition.interval",
            )?;
            tracing::info!("Migrating every {:?}, press Ctrl+C to stop", interval);
            manager
                .run_every(edge, cloud, interval, shutdown_signal())
                .await;
        }
        Command::Query {
            sql,
            from,
            to,
            day_of_week,
        } => {
            let spec = match (sql, from, to, day_of_week) {
                (Some(sql), ..) => QuerySpec::raw(sql),
                (None, Some(from), Some(to), _) => QuerySpec::between(from, to),
                (None, None, None, Some(day)) => QuerySpec::day_of_week(day),
                _ => return Err("specify --sql, --from/--to or --day-of-week".into()),
            };
            let outcome = resolve(edge, cloud, &spec).await?;
            print_json(&outcome)?;
        }
        Command::Compare { aggregate } => {
            let comparison = compare_aggregate(aggregate, edge, cloud).await?;
            print_json(&comparison)?;
        }
        Command::Stats => {
            let edge_rows = edge.count().await?;
            let cloud_rows = cloud.count().await?;
            print_json(&TierStats {
                edge_rows,
                cloud_rows,
                total_rows: edge_rows + cloud_rows,
                retention_rows: manager.retention_rows(),
            })?;
        }
        Command::Bench { rows, batch_size } => {
            let report = run_bench(edge, cloud, manager, rows, batch_size).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
