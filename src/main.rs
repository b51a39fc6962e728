use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecoguard::logging::{get_logger, init_logging};
use ecoguard::persistence::PersistenceManager;
use ecoguard::session::validate_credentials;
use ecoguard::statistics::JsonFileSink;
use ecoguard::{Config, Coordinator, HttpConnector, Scheduler};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version = env!("APP_VERSION"), about)]
struct Args {
    /// Configuration file; defaults to the first of the standard locations
    #[clap(long, env = "ECOGUARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Refresh periodically until interrupted (default).
    Run,

    /// Log in once to check the configured credentials.
    Validate,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load().context("Failed to load configuration")?,
    };
    config.apply_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn validate(config: &Config) -> Result<()> {
    validate_credentials(&config.portal_settings(), &config.credentials())
        .await
        .context("Credential check failed")?;
    info!("Credentials accepted for object {}", config.account.username);
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let tz = config.timezone()?;
    let connector = HttpConnector::new(config.portal_settings(), config.credentials());
    let coordinator = Coordinator::new(connector, tz);

    let mut scheduler = Scheduler::new(coordinator, config.refresh_interval()).with_statistics(
        Arc::new(JsonFileSink::new(&config.statistics.output_dir)),
        &config.statistics.currency,
    );
    if config.persistence.enabled {
        scheduler =
            scheduler.with_persistence(PersistenceManager::new(&config.persistence.state_file));
    }

    // Log every published snapshot
    let mut status_rx = scheduler.subscribe();
    let status_task = tokio::spawn(async move {
        let logger = get_logger("status");
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            if let Some(snapshot) = &status.snapshot {
                logger.info(&format!(
                    "Snapshot: month total {:?} kWh, today {:?} kWh, price {:?}",
                    snapshot.current_month_total_kwh, snapshot.today_kwh, snapshot.price_per_kwh
                ));
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let result = scheduler.run(shutdown_rx).await;
    drop(scheduler);
    status_task.abort();
    result.context("Refresh loop failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!("Ecoguard {} starting up", env!("APP_VERSION"));

    let outcome = match args.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Validate => validate(&config).await,
    };
    if let Err(e) = &outcome {
        error!("{:#}", e);
    }
    outcome
}
