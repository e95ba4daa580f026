pub mod local_store;
pub mod queue_store;
pub mod remote_store;

pub use local_store::LocalStore;
pub use queue_store::QueueStore;
pub use remote_store::{RemoteConnector, RemoteSession, RemoteWrite};
