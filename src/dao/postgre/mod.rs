use sqlx::{
    postgres::{PgPoolOptions, PgQueryResult},
    PgPool,
};

pub use self::path::get_path;

mod path;
mod subscription;

pub type PoolType = PgPool;
pub type PoolOption = PgPoolOptions;
pub type QueryResult = PgQueryResult;
