//! In-memory store

mod backend;
mod glob;

pub use backend::{MemoryConfig, MemoryConnector, MemoryStore};
pub use glob::glob_match;
