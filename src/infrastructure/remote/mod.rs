pub mod sqlx_remote_store;

pub use sqlx_remote_store::SqlxRemoteConnector;
