use async_trait::async_trait;

use crate::{
    error::Error,
    model::{Cursors, Subscription},
};

mod postgre;

pub use postgre::{get_path, PoolOption, PoolType, QueryResult};

/// Storage operations the polling engine depends on.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Point-in-time snapshot of every subscription.
    async fn list_all(&self) -> Result<Vec<Subscription>, Error>;

    /// Persists the cursors of one subscription. The test flag is cleared only
    /// when `test_sent` is set; a flag queued after the snapshot survives.
    async fn update_cursors(
        &self,
        id: i32,
        cursors: Cursors,
        test_sent: bool,
    ) -> Result<(), Error>;
}
