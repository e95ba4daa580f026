pub mod config;
pub mod error;
pub mod keyed_locks;

pub use config::AppConfig;
pub use error::{RemoteError, SyncError};
pub use keyed_locks::KeyedLocks;
