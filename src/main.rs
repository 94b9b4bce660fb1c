use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod filters;
mod handlers;
mod models;
mod routes;
mod store;
mod utils;


use config::{Config, StoreConfig};
use store::{AdStore, MemoryStore, PgStore};

async fn open_store(config: &Config) -> std::io::Result<Arc<dyn AdStore>> {
    match &config.store {
        StoreConfig::Memory { seed_tags } => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            tracing::info!(tags = ?seed_tags, "Seeding in-memory tags");
            Ok(Arc::new(MemoryStore::with_tag_names(seed_tags.iter().cloned())))
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PgStore::connect(database_url, *max_connections)
                .await
                .map_err(|e| std::io::Error::other(format!("Failed to connect to DB: {e}")))?;
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,goods=debug")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().map_err(std::io::Error::other)?;
    tracing::info!(store = config.store.name(), "Configuration loaded");

    let store = web::Data::from(open_store(&config).await?);

    let bind_addr = config.bind_addr();
    tracing::info!("Starting HTTP server on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .app_data(store.clone())
            .configure(routes::routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
