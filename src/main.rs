mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod state;
mod store;
mod utils;

use actix_cors::Cors;
use actix_web::{
    http::header::{self, HeaderName},
    middleware::Logger,
    web, App, HttpServer,
};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{AppConfig, StorageBackend},
    state::AppState,
    store::{JsonStore, Store},
};

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

async fn build_store(config: &AppConfig) -> io::Result<Arc<dyn Store>> {
    match config.storage {
        StorageBackend::Json => {
            let store = JsonStore::open(&config.data_dir).await.map_err(startup_error)?;
            Ok(Arc::new(store))
        }
        StorageBackend::Mongo => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| startup_error("DATABASE_URL must be set for STORAGE=mongo"))?;
            let db = database::MongoDB::new(url).await.map_err(startup_error)?;
            log::info!("✅ MongoDB connected successfully");
            Ok(Arc::new(db))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();
    let config = AppConfig::from_env();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config.map_err(|e| {
        log::error!("❌ {}", e);
        startup_error(e)
    })?;
    config.warn_if_insecure();

    log::info!("🚀 Starting Jersey Club EC...");
    log::info!("📊 Storage: {}", config.storage.as_str());

    let store = build_store(&config).await?;

    seeds::bootstrap(store.as_ref(), &config).await;

    let host = config.host.clone();
    let port = config.port;
    let origins = config.cors_origins.clone();
    let state = web::Data::new(AppState::new(store, config));

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                HeaderName::from_static("x-user-id"),
                HeaderName::from_static("x-user-email"),
                HeaderName::from_static("x-user-role"),
            ])
            .expose_headers(vec![header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
