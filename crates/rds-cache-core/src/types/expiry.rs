//! Expiry durations carried by a cache service

use std::time::Duration;

/// Default and long expiry windows of one cache service
///
/// Both are optional; a missing window means keys written through it never
/// expire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Expiry for ordinary entries
    pub default: Option<Duration>,
    /// Expiry for entries that should outlive ordinary ones
    pub long: Option<Duration>,
}

impl ExpiryPolicy {
    /// Policy with no expiry at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Policy built from hour/minute components
    ///
    /// Components too large to represent saturate at `u64::MAX` seconds.
    pub fn from_components(hours: u64, minutes: u64, long_hours: u64) -> Self {
        let default = hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60));
        Self {
            default: Some(Duration::from_secs(default)),
            long: Some(Duration::from_secs(long_hours.saturating_mul(3600))),
        }
    }

    /// Set the default window
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default = Some(ttl);
        self
    }

    /// Set the long window
    pub fn long_ttl(mut self, ttl: Duration) -> Self {
        self.long = Some(ttl);
        self
    }

    /// Pick the window for a write
    pub fn select(&self, long_time: bool) -> Option<Duration> {
        if long_time { self.long } else { self.default }
    }
}
