//! Gated downloads.
//!
//! # Data Flow
//! ```text
//! GET /download/<token>
//!     → [global limiter, applied router-wide]
//!     → download limiter (route layer, download routes only)
//!     → engine.rs (existence check → attachment stream)
//! ```
//!
//! # Design Decisions
//! - One concrete route per token: unknown tokens never touch the
//!   download limiter and fall through to the ordinary 404
//! - Existence is checked per request, never cached
//! - The engine never sees limiter state

pub mod catalog;
pub mod engine;

use std::sync::Arc;

use axum::{extract::Extension, middleware, routing::get, Router};

use crate::http::error::not_found;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

pub use catalog::{Catalog, DownloadEntry};

/// One `GET` route per catalogue entry, each behind `limiter`.
pub fn routes<S>(catalog: &Catalog, limiter: Arc<RateLimiter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    catalog.entries().fold(Router::new(), |router, entry| {
        tracing::debug!(
            token = %entry.token(),
            path = %entry.source().display(),
            "Download route registered"
        );
        router.route(
            &catalog.route_path(entry),
            get(engine::serve_download)
                .fallback(not_found)
                .layer(Extension(Arc::clone(entry)))
                .route_layer(middleware::from_fn_with_state(
                    Arc::clone(&limiter),
                    rate_limit_middleware,
                )),
        )
    })
}
