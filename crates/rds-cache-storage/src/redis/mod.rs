//! Redis store

mod backend;
mod config;

pub use backend::{RedisConnector, RedisStore};
pub use config::ConnectionOptions;
