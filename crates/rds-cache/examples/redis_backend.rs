use rds_cache::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    // Accepts a URL or an endpoint list such as "127.0.0.1:6379,password=secret"
    let target = std::env::var("REDIS_URL").unwrap_or_else(|_| "127.0.0.1:6379".to_string());
    println!("Connecting to Redis at {}", target);

    let connector = RedisConnector::new().with_connect_timeout(Duration::from_secs(2));
    let cache = CacheService::connect(&connector, &target, CacheServiceConfig::default()).await;

    if !cache.is_connected() {
        println!("Not connected; every call below is a no-op returning defaults");
    }

    cache
        .string_set("hello", "world", DEFAULT_DB, Some(Duration::from_secs(300)))
        .await;
    println!("hello = {:?}", cache.string_get::<String>("hello", DEFAULT_DB).await);

    cache.hash_set("user_1", "name", "sachin", DEFAULT_DB).await;
    println!(
        "user_1.name = {:?}",
        cache.hash_get("user_1", "name", DEFAULT_DB).await
    );

    // try_ twins surface the underlying error
    if let Err(e) = cache.try_exists("hello", DEFAULT_DB).await {
        eprintln!("exists failed ({}): {}", e.kind(), e);
    }

    cache.remove_key("hello", DEFAULT_DB).await;
    cache.remove_key("user_1", DEFAULT_DB).await;
}
