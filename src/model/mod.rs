//! Database models module

mod subscription;
mod table;

pub use subscription::{Cursors, NewSubscription, Subscription, REDACTED_JWT};
pub use table::Table;
