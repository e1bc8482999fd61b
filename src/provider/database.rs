use crate::{
    configuration::Config,
    dao::{PoolOption, PoolType},
    error::Error,
    model::{Subscription, Table},
};

#[derive(Debug)]
pub struct DatabasePool {
    pub subscription: Table<Subscription>,
    pub pool: PoolType,
}

impl DatabasePool {
    pub async fn new(config: &Config) -> Result<DatabasePool, Error> {
        let pool = PoolOption::new()
            .max_connections(config.max_connections)
            .connect(config.database_url.as_str())
            .await?;

        Ok(DatabasePool {
            subscription: Table::new(pool.clone()),
            pool,
        })
    }
}
