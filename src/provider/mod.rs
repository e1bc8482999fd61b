pub use self::{
    database::DatabasePool,
    home_server::{HomeServerClient, HomeServerConnector, LemmyConnector},
};

mod database;
mod home_server;
