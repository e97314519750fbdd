//! HTTP surface of the oracle service.
//!
//! Handlers translate query-string parameters into core calls and render
//! the answers; they hold no analysis or locking logic of their own.

mod handlers;
pub mod html;
mod response;

use augur_core::ServiceContext;
use axum::Router;
use axum::routing::get;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Assets bundled with this crate, used when no other directory is configured.
pub fn default_static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

pub fn build_router(ctx: Arc<ServiceContext>) -> Router {
    let static_files = ServeDir::new(&ctx.config().static_dir);
    Router::new()
        .route("/", get(handlers::index))
        .route("/source", get(handlers::source))
        .route("/file", get(handlers::file))
        .route("/query", get(handlers::query))
        .nest_service("/static", static_files)
        .with_state(ctx)
}
