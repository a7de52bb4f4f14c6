use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use eventhub::config::{Settings, StorageBackend};
use eventhub::routes::{self, handle_json_payload_error, handle_query_payload_error};
use eventhub::services::{CacheManager, EventStore, HttpNotifier, LogNotifier, Notifier};
use eventhub::{AppContext, Event, Matcher, MemoryStore, PostgresStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging; LOG_LEVEL / LOG_FORMAT win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting EventHub service...");

    // Initialize cache manager (optional - app can work without it)
    let cache = match &settings.cache.redis_url {
        Some(redis_url) => {
            let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
            let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

            match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
                Ok(c) => {
                    info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                    Some(Arc::new(c))
                }
                Err(e) => {
                    error!("Failed to connect to Redis ({}), running without cache", e);
                    None
                }
            }
        }
        None => {
            info!("No redis_url configured, match caching disabled");
            None
        }
    };

    // Notification gateway
    let notifier: Arc<dyn Notifier> = match &settings.notifications.endpoint {
        Some(endpoint) => {
            let notifier = HttpNotifier::new(
                endpoint.clone(),
                settings.notifications.sender.clone(),
                settings.notifications.api_key.clone(),
                Duration::from_secs(settings.notifications.timeout_secs),
            )
            .map_err(|e| {
                error!("Failed to build notification client: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            info!("Notifications will be sent to {}", endpoint);
            Arc::new(notifier)
        }
        None => {
            warn!("No notification endpoint configured, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    // Initialize matcher with configured weights
    let weights = settings.weights();
    let matcher = Matcher::new(
        weights,
        settings.matching.min_score,
        settings.matching.max_results,
    );

    info!("Matcher initialized with weights: {:?}", weights);

    let qr_base_url = settings.notifications.qr_base_url.clone();

    // Build application context
    let ctx = match settings.storage.backend {
        StorageBackend::Postgres => {
            let db_max_conn = settings.database.max_connections.unwrap_or(10);
            let db_min_conn = settings.database.min_connections.unwrap_or(1);

            let store = PostgresStore::from_settings(
                &settings.database.url,
                Some(db_max_conn),
                Some(db_min_conn),
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;

            info!("PostgreSQL store initialized (max: {} connections)", db_max_conn);
            AppContext::new(Arc::new(store), notifier, matcher, cache, qr_base_url)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory store, data will not survive a restart");
            let store = MemoryStore::new();
            for seed in &settings.storage.seed_events {
                store.put_event(&Event::from(seed)).await.map_err(|e| {
                    error!("Failed to seed event {}: {}", seed.event_id, e);
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
            }
            info!("Seeded {} events into the in-memory store", settings.storage.seed_events.len());
            AppContext::new(Arc::new(store), notifier, matcher, cache, qr_base_url)
        }
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
