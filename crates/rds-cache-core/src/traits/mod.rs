//! Core traits for cache operations

mod codec;
mod key;
mod metrics;
mod store;

#[cfg(feature = "tracing")]
mod tracing_metrics;

pub use codec::{Codec, JsonCodec};
pub use key::{build_key, CacheKey, KeyBuilder, KEY_SEPARATOR};
pub use self::metrics::{CacheMetrics, CacheOperation, NoopMetrics};
pub use store::{Connector, StoreClient};

#[cfg(feature = "msgpack")]
pub use codec::MsgPackCodec;

#[cfg(feature = "bincode")]
pub use codec::BincodeCodec;

#[cfg(feature = "metrics")]
pub use self::metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use tracing_metrics::TracingMetrics;
