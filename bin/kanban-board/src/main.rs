//! # Kanban-Board Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod config;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use kb_api::handlers::AppState;
use kb_core::{BoardService, DocumentStore};

#[cfg(feature = "db-sqlite")]
use kb_db_sqlite::SqliteDocumentStore;

#[cfg(all(feature = "store-memory", not(feature = "db-sqlite")))]
use kb_store_memory::MemoryDocumentStore;

#[cfg(feature = "auth-simple")]
use kb_auth_simple::SimpleAuthProvider;

#[cfg(feature = "auth-simple")]
use secrecy::ExposeSecret;

#[cfg(not(any(feature = "db-sqlite", feature = "store-memory")))]
compile_error!("enable a document store: `db-sqlite` or `store-memory`");

#[cfg(not(feature = "auth-simple"))]
compile_error!("enable an auth provider: `auth-simple`");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let settings = config::Settings::load().context("loading settings")?;

    // 1. Initialize Document Store Implementation
    #[cfg(feature = "db-sqlite")]
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(&settings.database_url).await?);

    #[cfg(all(feature = "store-memory", not(feature = "db-sqlite")))]
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = {
        let secret = settings
            .auth_secret
            .as_ref()
            .context("KANBAN_AUTH_SECRET must be set")?;
        SimpleAuthProvider::new(secret.expose_secret())
    };

    // 3. Wrap in AppState (dynamic dispatch keeps plugins swappable)
    let state = web::Data::new(AppState {
        board: BoardService::new(store),
        auth: Box::new(auth),
    });

    let addr = (settings.host.clone(), settings.port);
    log::info!("kanban-board starting on http://{}:{}", addr.0, addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(kb_api::middleware::standard_middleware())
            .wrap(kb_api::middleware::cors_policy())
            .configure(kb_api::configure_routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
