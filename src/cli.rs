//! Command-line interface
//!
//! `serve` runs the HTTP API together with the scheduler. The other commands
//! run a single maintenance step and exit.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::{
    configuration::{get_configuration, set_configuration, Config, State},
    error::Error,
    handler::{Engine, SweepReport, SweepSettings},
    provider::{DatabasePool, LemmyConnector},
    push::Dispatcher,
};

/// Lemmy push notification bridge
#[derive(Parser)]
#[command(name = "notifier")]
#[command(about = "Polls Lemmy home servers and forwards new notifications to devices", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the scheduler (default if no command specified)
    Serve,

    /// Check every subscription once, then exit
    Sweep,

    /// Create the database schema
    Migrate,
}

/// Initialize configuration and return Config
pub fn init_config() -> Result<Config, Error> {
    set_configuration()?;
    get_configuration()
}

pub async fn run_migrate() -> Result<(), Error> {
    let config = init_config()?;
    let database = DatabasePool::new(&config).await?;

    info!("Running database migrations...");
    State::init_migrations(&database).await?;
    info!("Migrations complete");

    Ok(())
}

pub async fn run_sweep() -> Result<SweepReport, Error> {
    let config = init_config()?;
    let database = DatabasePool::new(&config).await?;
    let dispatcher = Dispatcher::from_config(&config)?;
    let connector = LemmyConnector::new(std::time::Duration::from_secs(
        config.query_timeout,
    ))?;

    let engine = Engine::new(
        Arc::new(database.subscription.clone()),
        Arc::new(connector),
        Arc::new(dispatcher),
        SweepSettings::from(&config),
    );

    let report = engine.sweep().await;
    engine.flush().await;

    Ok(report)
}
