pub mod connection_pool;
pub mod row_mapper;
pub mod sqlite_local_store;
pub mod statements;

pub use connection_pool::ConnectionPool;
pub use sqlite_local_store::SqliteLocalStore;
