pub mod database;
pub mod jobs;
pub mod queue;
pub mod remote;
