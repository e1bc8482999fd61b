use clap::Parser;
use tracing::{error, info, Level};

use notifier::{
    cli::{self, Cli, Commands},
    configuration::{AppState, Config, State},
    error::Error,
    handler::sweep_task,
    provider::DatabasePool,
    push::Dispatcher,
    server,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let result = app_main().await;

    if let Err(err) = &result {
        error!("{}", err);
    }

    result
}

async fn app_main() -> Result<(), Error> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level({
            #[cfg(debug_assertions)]
            {
                Level::DEBUG
            }

            #[cfg(not(debug_assertions))]
            {
                Level::INFO
            }
        })
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match Cli::parse().command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::Sweep => {
            let report = cli::run_sweep().await?;
            info!(
                "Sweep finished: {} checked, {} failed, {} dispatched",
                report.checked, report.failed, report.dispatched
            );
            Ok(())
        },
        Commands::Migrate => cli::run_migrate().await,
    }
}

async fn serve() -> Result<(), Error> {
    let (config, database) = match init().await {
        Ok((config, database)) => (config, database),
        Err(e) => return Err(Error::ConfigurationError(e.to_string())),
    };

    let dispatcher = Dispatcher::from_config(&config)?;
    let state = State::new(config, database, dispatcher).await?;
    let app_state = AppState::new(state);

    let (_, _) = tokio::try_join!(
        server::server_task(&app_state),
        sweep_task(app_state.clone()),
    )?;

    Ok(())
}

async fn init() -> Result<(Config, DatabasePool), Error> {
    let config = cli::init_config()?;
    let database = DatabasePool::new(&config).await?;
    Ok((config, database))
}
