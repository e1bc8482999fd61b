//! Notification engine
//!
//! Cursor strategies, payload normalization, the sweep over all subscriptions
//! and the scheduler that drives it.

mod cursor;
mod normalizer;
mod scheduler;
mod sweep;

pub use cursor::{CursorStrategy, ItemKind, Selection, UnreadItem};
pub use scheduler::{run, sweep_task, SweepTrigger};
pub use sweep::{Engine, SweepReport, SweepSettings};
