//! Named cache services built lazily from settings

use rds_cache::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rds_cache=debug")))
        .init();

    let settings = CacheSettings {
        default_target: "memory".to_string(),
        user_session_target: "memory".to_string(),
        // No target: the app cache is built but never connects
        app_target: String::new(),
        ..Default::default()
    };

    let connector = MemoryConnector::default();
    let registry = Arc::new(CacheRegistry::new(connector.clone(), settings));

    // Concurrent first access still builds a single service
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                let cache = registry.default_cache().await;
                cache.add(format!("visit_{}", i), &i, false).await;
            })
        })
        .collect();
    for task in tasks {
        let _ = task.await;
    }
    println!("Connections opened: {}", connector.connects());

    let sessions = registry.user_session_cache().await;
    sessions.add_set("online", "user-7", DEFAULT_DB).await;
    println!("user-7 online: {}", sessions.set_contains("online", "user-7", DEFAULT_DB).await);

    let app = registry.app_cache().await;
    println!(
        "App cache connected: {}, write accepted: {}",
        app.is_connected(),
        app.string_set("k", "v", DEFAULT_DB, None).await
    );
}
