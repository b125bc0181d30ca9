//! Cache key trait and key composition

use std::fmt::Display;

/// Separator between the base name and each parameter value
pub const KEY_SEPARATOR: char = '_';

/// Trait for types that can be used as cache keys
///
/// Implement this trait to use custom types as cache keys.
pub trait CacheKey: Send + Sync {
    /// Generate the key string
    fn cache_key(&self) -> String;
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for &str {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for &String {
    fn cache_key(&self) -> String {
        (*self).clone()
    }
}

impl<T1: Display + Send + Sync, T2: Display + Send + Sync> CacheKey for (T1, T2) {
    fn cache_key(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.0, self.1)
    }
}

impl<T1: Display + Send + Sync, T2: Display + Send + Sync, T3: Display + Send + Sync> CacheKey
    for (T1, T2, T3)
{
    fn cache_key(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}", self.0, self.1, self.2)
    }
}

/// Compose a key from a base name and named parameters
///
/// Parameters are appended in iteration order as `_value`; `None` values are
/// skipped. The parameter names only document the call site.
///
/// ```
/// use rds_cache_core::build_key;
///
/// let key = build_key("Order", [("id", Some(5)), ("type", None)]);
/// assert_eq!(key, "Order_5");
/// ```
pub fn build_key<I, K, V>(name: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    V: Display,
{
    let mut key = name.to_string();
    for (_, value) in params {
        if let Some(value) = value {
            key.push(KEY_SEPARATOR);
            key.push_str(&value.to_string());
        }
    }
    key
}

/// Builder for keys whose parameters have mixed types
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    name: String,
    params: Vec<(String, Option<String>)>,
}

impl KeyBuilder {
    /// Start a key from its base name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter; `None` is recorded but left out of the key
    pub fn param<V: Display>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.params
            .push((name.into(), value.map(|v| v.to_string())));
        self
    }

    /// Base name of the key
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compose the key
    pub fn build(&self) -> String {
        build_key(
            &self.name,
            self.params.iter().map(|(n, v)| (n.as_str(), v.as_deref())),
        )
    }
}

impl CacheKey for KeyBuilder {
    fn cache_key(&self) -> String {
        self.build()
    }
}
