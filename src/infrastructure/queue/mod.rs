pub mod json_file_queue_store;
pub mod rows;
pub mod sqlite_queue_store;

pub use json_file_queue_store::JsonFileQueueStore;
pub use sqlite_queue_store::SqliteQueueStore;
