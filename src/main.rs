use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use thoughts_journal::api::{self, AppState};
use thoughts_journal::blob::{BlobStore, RemoteBlobStore, SqliteBlobStore};
use thoughts_journal::config::{BlobBackend, Config};
use thoughts_journal::metrics::MetricsCollector;
use thoughts_journal::store::Store;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize store
    let store = Arc::new(Store::new(&config.database_path).map_err(|e| {
        log::error!("Failed to initialize database {}: {}", config.database_path, e);
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?);
    log::info!("Database: {}", config.database_path);

    let blobs: Arc<dyn BlobStore> = match &config.blob_backend {
        BlobBackend::Sqlite { public_base_url } => {
            log::info!("Blob backend: sqlite");
            Arc::new(SqliteBlobStore::new(store.clone(), public_base_url.clone()))
        }
        BlobBackend::Remote { endpoint, token } => {
            log::info!("Blob backend: remote ({})", endpoint);
            Arc::new(RemoteBlobStore::new(endpoint.clone(), token.clone()))
        }
    };

    let state = web::Data::new(AppState {
        store,
        blobs,
        passphrase: config.passphrase.clone(),
    });
    let metrics_collector = MetricsCollector::new();
    let payload_limit = config.payload_limit;

    log::info!("Starting thoughts-journal on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .wrap(metrics_collector.clone())
            .app_data(state.clone())
            .app_data(web::Data::new(metrics_collector.clone()))
            .configure(|cfg| api::configure_routes_with_limit(cfg, payload_limit))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
