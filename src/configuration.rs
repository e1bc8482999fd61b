use std::{env, fs, ops::Deref, path::Path, str::FromStr, sync::Arc};

use anyhow::Context;
use tracing::warn;

use crate::{
    dao::get_path,
    error::Error,
    handler::{CursorStrategy, SweepTrigger},
    provider::DatabasePool,
    push::Dispatcher,
};

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub database: DatabasePool,
    pub dispatcher: Arc<Dispatcher>,
    pub trigger: SweepTrigger,
}

impl State {
    pub async fn new(
        config: Config,
        database: DatabasePool,
        dispatcher: Dispatcher,
    ) -> Result<State, Error> {
        Self::init_migrations(&database).await?;
        Ok(Self {
            config,
            database,
            dispatcher: Arc::new(dispatcher),
            trigger: SweepTrigger::new(),
        })
    }

    pub async fn init_migrations(database: &DatabasePool) -> Result<(), Error> {
        let files = ["account_notification.sql"];
        let dir = env!("CARGO_MANIFEST_DIR");

        for file in files {
            let path = get_path(dir, file);
            let data = fs::read_to_string(&path).with_context(|| {
                format!("could not read migration {}", path.display())
            })?;
            sqlx::raw_sql(data.as_str()).execute(&database.pool).await?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ApnsConfig {
    pub key_id: String,
    pub team_id: String,
    pub key_path: String,
    pub bundle_id: String,
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub sweep_interval: u64,
    pub sweep_jitter: u64,
    pub query_timeout: u64,
    pub webhook_connect_timeout: u64,
    pub push_timeout: u64,
    pub page_limit: i64,
    pub cursor_strategy: CursorStrategy,
    pub cursor_skew: i64,
    pub max_concurrent_instances: usize,
    pub max_push_tasks: usize,
    pub apns: Option<ApnsConfig>,
}

pub fn get_configuration() -> Result<Config, Error> {
    let database_url = env::var("DATABASE_URL")?;
    let max_connections = env::var("MAX_DB_CONNECTIONS")?.parse()?;
    let server_host = env::var("SERVER_HOST")?;
    let port: u16 = env::var("PORT")?.parse()?;
    let allowed_origins = env::var("ALLOWED_ORIGINS")?
        .split(',')
        .map(|item| item.trim().to_owned())
        .filter(|item| !item.is_empty())
        .collect::<Vec<String>>();

    let sweep_interval = env::var("SWEEP_INTERVAL_IN_SEC")?.parse()?;
    let sweep_jitter = env::var("SWEEP_JITTER_IN_SEC")?.parse()?;
    let query_timeout = env::var("QUERY_TIMEOUT_IN_SEC")?.parse()?;
    let webhook_connect_timeout =
        env::var("WEBHOOK_CONNECT_TIMEOUT_IN_SEC")?.parse()?;
    let push_timeout = env::var("PUSH_TIMEOUT_IN_SEC")?.parse()?;
    let page_limit = env::var("PAGE_LIMIT")?.parse()?;
    let cursor_strategy =
        CursorStrategy::from_str(&env::var("CURSOR_STRATEGY")?)?;
    let cursor_skew = env::var("CURSOR_SKEW_IN_SEC")?.parse()?;
    let max_concurrent_instances =
        env::var("MAX_CONCURRENT_INSTANCES")?.parse()?;
    let max_push_tasks = env::var("MAX_PUSH_TASKS")?.parse()?;

    if sweep_interval == 0 {
        return Err(Error::ConfigurationError(String::from(
            "SWEEP_INTERVAL_IN_SEC must be greater than zero",
        )));
    }

    if max_concurrent_instances == 0 || max_push_tasks == 0 {
        return Err(Error::ConfigurationError(String::from(
            "MAX_CONCURRENT_INSTANCES and MAX_PUSH_TASKS must be greater than zero",
        )));
    }

    let config = Config {
        database_url,
        max_connections,
        server_host,
        port,
        allowed_origins,
        sweep_interval,
        sweep_jitter,
        query_timeout,
        webhook_connect_timeout,
        push_timeout,
        page_limit,
        cursor_strategy,
        cursor_skew,
        max_concurrent_instances,
        max_push_tasks,
        apns: get_apns_configuration()?,
    };

    Ok(config)
}

/// APNs is optional: all four values must be present to enable the channel.
fn get_apns_configuration() -> Result<Option<ApnsConfig>, Error> {
    let key_id = optional_var("APNS_KEY_ID");
    let team_id = optional_var("APNS_TEAM_ID");
    let key_path = optional_var("APNS_KEY_PATH");
    let bundle_id = optional_var("APNS_BUNDLE_ID");

    let (Some(key_id), Some(team_id), Some(key_path), Some(bundle_id)) =
        (key_id, team_id, key_path, bundle_id)
    else {
        warn!("APN key id, team id, key path or bundle id is empty; not initializing APN service.");
        return Ok(None);
    };

    let production = match optional_var("APNS_PRODUCTION") {
        Some(value) => value.parse()?,
        None => false,
    };

    Ok(Some(ApnsConfig {
        key_id,
        team_id,
        key_path,
        bundle_id,
        production,
    }))
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Loads `notifier.conf` (defaults) and, when present, `.env` (deployment
/// secrets) into the process environment. Variables already set in the
/// environment win over both files.
pub fn set_configuration() -> Result<(), Error> {
    let config_file: &str = ".env";
    let notifier_config_file: &str = "notifier.conf";

    let directory = env!("CARGO_MANIFEST_DIR");
    let path = Path::new(directory).join(config_file);
    let notifier_config_path = Path::new(directory).join(notifier_config_file);

    let notifier_config_string = fs::read_to_string(&notifier_config_path)
        .with_context(|| {
            format!("could not read {}", notifier_config_path.display())
        })?;

    if path.exists() {
        let config_string = fs::read_to_string(path)?;
        apply_config(parse_config_string(&config_string));
    }

    apply_config(parse_config_string(&notifier_config_string));

    Ok(())
}

fn apply_config(params: Vec<(String, String)>) {
    for (key, value) in params {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
        }
    }
}

fn parse_config_string(config: &str) -> Vec<(String, String)> {
    config
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect()
}
