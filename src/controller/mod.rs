//! API Controller modules

pub mod notifications;
pub mod version;
