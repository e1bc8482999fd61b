use std::marker::PhantomData;

use crate::dao::PoolType;

/// Query handle for the rows of one model. Cloning shares the pool.
#[derive(Debug)]
pub struct Table<T> {
    pub pool: PoolType,
    rows: PhantomData<fn() -> T>,
}

impl<T> Table<T> {
    pub fn new(pool: PoolType) -> Self {
        Table {
            pool,
            rows: PhantomData,
        }
    }
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Table::new(self.pool.clone())
    }
}
