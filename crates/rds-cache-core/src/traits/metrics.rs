//! Metrics trait for cache observability

use std::time::Duration;

use crate::CacheError;

/// Facade operation for metric labeling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheOperation {
    StringSet,
    StringGet,
    Exists,
    Remove,
    HashSet,
    HashGet,
    HashDelete,
    HashExists,
    SetAdd,
    SetMembers,
    SetRemove,
    SetContains,
    FlushDb,
    FlushAll,
    Keys,
}

impl CacheOperation {
    /// Get operation as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOperation::StringSet => "string_set",
            CacheOperation::StringGet => "string_get",
            CacheOperation::Exists => "exists",
            CacheOperation::Remove => "remove",
            CacheOperation::HashSet => "hash_set",
            CacheOperation::HashGet => "hash_get",
            CacheOperation::HashDelete => "hash_delete",
            CacheOperation::HashExists => "hash_exists",
            CacheOperation::SetAdd => "set_add",
            CacheOperation::SetMembers => "set_members",
            CacheOperation::SetRemove => "set_remove",
            CacheOperation::SetContains => "set_contains",
            CacheOperation::FlushDb => "flush_db",
            CacheOperation::FlushAll => "flush_all",
            CacheOperation::Keys => "keys",
        }
    }
}

/// Trait for cache metrics/observability
///
/// Implement this to integrate with your metrics system (Prometheus, StatsD, etc.)
pub trait CacheMetrics: Send + Sync + 'static {
    /// Record a typed read that produced a value
    fn record_hit(&self, key: &str);

    /// Record a typed read that produced no value
    fn record_miss(&self, key: &str);

    /// Record an operation that fell back to its default result
    fn record_degraded(&self, operation: CacheOperation, error: &CacheError);

    /// Record operation latency
    fn record_latency(&self, operation: CacheOperation, duration: Duration);
}

/// No-op metrics implementation (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl CacheMetrics for NoopMetrics {
    #[inline]
    fn record_hit(&self, _key: &str) {}

    #[inline]
    fn record_miss(&self, _key: &str) {}

    #[inline]
    fn record_degraded(&self, _operation: CacheOperation, _error: &CacheError) {}

    #[inline]
    fn record_latency(&self, _operation: CacheOperation, _duration: Duration) {}
}

/// Metrics adapter using the `metrics` crate
///
/// # Example
/// ```ignore
/// use rds_cache_core::MetricsCrateAdapter;
///
/// let metrics = MetricsCrateAdapter::new("rds_cache");
/// // Emits: rds_cache_hits_total, rds_cache_degraded_total, etc.
/// ```
#[cfg(feature = "metrics")]
#[derive(Debug, Clone)]
pub struct MetricsCrateAdapter {
    prefix: String,
}

#[cfg(feature = "metrics")]
impl MetricsCrateAdapter {
    /// Create a new adapter with the given metric name prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }
}

#[cfg(feature = "metrics")]
impl CacheMetrics for MetricsCrateAdapter {
    fn record_hit(&self, _key: &str) {
        metrics::counter!(self.metric_name("hits_total")).increment(1);
    }

    fn record_miss(&self, _key: &str) {
        metrics::counter!(self.metric_name("misses_total")).increment(1);
    }

    fn record_degraded(&self, operation: CacheOperation, error: &CacheError) {
        metrics::counter!(
            self.metric_name("degraded_total"),
            "operation" => operation.as_str(),
            "kind" => error.kind()
        )
        .increment(1);
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        metrics::histogram!(
            self.metric_name("operation_duration_seconds"),
            "operation" => operation.as_str()
        )
        .record(duration.as_secs_f64());
    }
}
