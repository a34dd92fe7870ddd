//! All API endpoint setup

use axum::Router;
use axum::routing::get;

pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use response::Error;
pub use response::Success;

use crate::storage::Storage;

mod notes;
mod request;
mod response;
mod stats;

/// Get the Axum router for all API routes
pub fn router<S: Storage>() -> Router {
    let notes = Router::new()
        .route("/", get(notes::list::<S>).post(notes::create::<S>))
        .route(
            "/{note}",
            get(notes::single::<S>)
                .put(notes::update::<S>)
                .delete(notes::delete::<S>),
        )
        .route("/{note}/audit", get(notes::audit_trail::<S>));

    Router::new()
        .nest("/notes", notes)
        .route("/stats", get(stats::stats::<S>))
        .route("/search", get(stats::search::<S>))
}
