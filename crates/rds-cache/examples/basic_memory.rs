//! Basic example demonstrating rds-cache with the in-process store

use rds_cache::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Product {
    id: u64,
    name: String,
    price: i32,
}

#[tokio::main]
async fn main() {
    println!("=== rds-cache Basic Example ===\n");

    let expiry = ExpiryPolicy::from_components(0, 5, 24);
    let cache = CacheService::with_config(
        MemoryStore::with_defaults(),
        CacheServiceConfig::with_expiry(expiry),
    );

    let product = Product {
        id: 42,
        name: "Hot-rolled coil".to_string(),
        price: 3890,
    };
    let key = cache.build_key("Product", [("id", Some(product.id))]);

    println!("Storing {} ...", key);
    cache
        .string_set(&key, &product, DEFAULT_DB, Some(Duration::from_secs(300)))
        .await;

    match cache.string_get::<Product>(&key, DEFAULT_DB).await {
        Some(p) => println!("✅ Cache HIT: {} at {}", p.name, p.price),
        None => println!("❌ Cache MISS"),
    }

    // Hashes and sets
    cache
        .hash_set_many("Quote_42", [("open", "3880"), ("close", "3890")], DEFAULT_DB)
        .await;
    let prices = cache
        .hash_get_many("Quote_42", &["open", "close", "high"], DEFAULT_DB)
        .await;
    println!("Quote fields: {:?}", prices);

    let added = cache.add_set_many("Watchers_42", &["u1", "u2", "u1"], DEFAULT_DB).await;
    println!("Added {} watchers: {:?}", added, cache.get_set("Watchers_42", DEFAULT_DB).await);

    // Legacy family lives in database 0 and uses the configured expiry
    cache.add("greeting", "hello", false).await;
    println!("Legacy get: {:?}", cache.get::<String>("greeting").await);
    println!("Keys in db 0: {:?}", cache.get_keys("*", LEGACY_DB).await);

    // Misses and failures look the same
    println!("Missing: {:?}", cache.string_get::<Product>("Product_0", DEFAULT_DB).await);

    println!("\n=== Example Complete ===");
}
