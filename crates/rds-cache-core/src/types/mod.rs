//! Core types for cache operations

mod db;
mod expiry;

pub use db::{DbIndex, DEFAULT_DB, LEGACY_DB};
pub use expiry::ExpiryPolicy;
