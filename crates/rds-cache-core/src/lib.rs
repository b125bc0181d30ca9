//! rds-cache-core: Core traits and types for the rds-cache library
//!
//! This crate provides the error taxonomy, the codec seam, the remote-store
//! capability and the key helpers shared by the storage backends and the
//! cache facade.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
