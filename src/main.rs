#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::router;
use crate::seed::ensure_sample_notes;
use crate::storage::Config as StorageConfig;
use crate::storage::Memory;
use crate::storage::Postgres;
use crate::storage::Storage;
use crate::store::NoteStore;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

mod api;
mod audit;
mod graceful_shutdown;
mod locks;
mod notes;
mod root;
mod seed;
mod storage;
mod store;
#[cfg(test)]
mod tests;
mod utils;

const DEFAULT_RUST_LOG: &str = "cloud_notes=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:5000";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app(StorageConfig::detect()).await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Database connection and schema
/// - Sample notes
pub async fn setup_app(config: StorageConfig) -> Result<Router> {
    match config {
        StorageConfig::Memory => create_app(Memory::new()).await,
        StorageConfig::DatabaseUrl(database_url) => {
            create_app(Postgres::connect(&database_url).await?).await
        }
        StorageConfig::ExistingConnection(pool) => {
            create_app(Postgres::new_with_pool(pool).await?).await
        }
    }
}

/// Seed the storage and put the note store in front of it
async fn create_app<S: Storage>(storage: S) -> Result<Router> {
    ensure_sample_notes(&storage).await?;

    Ok(create_router(NoteStore::new(storage)))
}

/// Create the router for Cloud Notes
fn create_router<S: Storage>(store: NoteStore<S>) -> Router {
    Router::new()
        .route("/", get(root::index::<S>))
        .route("/health", get(root::health::<S>))
        .nest("/api", router::<S>())
        .fallback(root::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(store))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(env_var_or_else("RUST_LOG", || {
            DEFAULT_RUST_LOG.into()
        })))
        .with(fmt::layer())
        .init();
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        address.set_port(port.parse::<u16>()?);
    }

    Ok(address)
}
