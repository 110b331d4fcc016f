// src/main.rs
mod config;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod repositories;
mod services;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::{debug, info, warn};

use crate::config::AppConfig;
use crate::repositories::blog_store::BlogStore;
use crate::repositories::memory_store::MemoryStore;
use crate::repositories::pg_store::{apply_schema, PgStore};
use crate::services::auth_services::AuthService;
use crate::services::media_storage::MediaStorage;
use crate::services::page_cache::PageCache;
use crate::services::seed_loader::seed_from_file;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub page_cache: Arc<PageCache>,
    pub media: MediaStorage,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let pg_pool = config::get_pg_pool()?;
    let app_config = AppConfig::from_env(pg_pool.is_some())?;

    let store: Arc<dyn BlogStore> = match pg_pool {
        Some(pool) => {
            apply_schema(&pool).await.context("failed to apply database schema")?;
            info!("Using Postgres store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("PG_HOST not set, using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if let Some(seed_file) = &app_config.seed_file {
        let created = seed_from_file(store.as_ref(), seed_file).await?;
        info!("seed file {} applied, {} new groups", seed_file.display(), created);
    }

    tokio::fs::create_dir_all(&app_config.media_root)
        .await
        .with_context(|| format!("cannot create media root {}", app_config.media_root.display()))?;

    let auth_data = web::Data::new(AuthService::new(
        app_config.jwt_secret.clone(),
        app_config.session_ttl,
    ));
    let state = web::Data::new(AppState {
        store,
        page_cache: Arc::new(PageCache::new(app_config.cache_ttl)),
        media: MediaStorage::new(&app_config.media_root),
    });

    // expired pages would otherwise stay in memory until their URI is hit again
    let purge_cache = state.page_cache.clone();
    let purge_every = app_config.cache_ttl.max(std::time::Duration::from_secs(1));
    actix_web::rt::spawn(async move {
        let mut tick = tokio::time::interval(purge_every);
        loop {
            tick.tick().await;
            let purged = purge_cache.purge_expired();
            if purged > 0 {
                debug!("purged {} expired cached pages, {} left", purged, purge_cache.len());
            }
        }
    });

    let bind_address = format!("0.0.0.0:{}", app_config.port);
    info!("Starting server on {}", bind_address);

    let allowed_origins = app_config.allowed_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["authorization", "content-type", "accept", "x-requested-with"])
            .supports_credentials()
            .max_age(3600);

        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(auth_data.clone())
            .configure(handlers::configure)
            .default_service(web::to(handlers::not_found))
    })
    .bind(&bind_address)
    .with_context(|| format!("cannot bind {}", bind_address))?
    .run()
    .await
    .context("server error")
}
