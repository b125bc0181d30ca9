//! Logical database indexes

/// Index of a logical database partition in the remote store
pub type DbIndex = u32;

/// Database used by the typed string, hash and set operations
pub const DEFAULT_DB: DbIndex = 1;

/// Database used by the untyped legacy operations and admin commands
pub const LEGACY_DB: DbIndex = 0;
