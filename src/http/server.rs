//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: pages, downloads, static fallback
//! - Wire up middleware (request ID, tracing, headers, limits, panics)
//! - Bind server to listener and serve with graceful shutdown
//!
//! # Layer order (outermost first)
//! ```text
//! trim trailing slash (wraps the router, so it runs before routing)
//!     → set x-request-id → propagate x-request-id → trace
//!     → security headers → timeout → body limit → catch panic
//!     → metrics → global rate limit → routes / fallback
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Request, middleware, Router, ServiceExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Layer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::SiteConfig;
use crate::downloads;
use crate::http::error::handle_panic;
use crate::http::request::{request_span, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::security::{headers, rate_limit::rate_limit_middleware, RateLimiter};
use crate::site::Site;

/// Error type for server startup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to prepare site: {0}")]
    Site(#[source] io::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The routed site with path normalisation in front of it.
pub type App = NormalizePath<Router>;

/// HTTP server for the site.
pub struct HttpServer {
    app: App,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: SiteConfig) -> Result<Self, ServerError> {
        let site = Site::from_config(&config).map_err(ServerError::Site)?;
        Ok(Self::with_site(&config, site))
    }

    /// Create a server around an already-resolved [`Site`].
    pub fn with_site(config: &SiteConfig, site: Site) -> Self {
        tracing::info!(
            pages = site.pages.len(),
            downloads = site.catalog.len(),
            "Site loaded"
        );
        let router = Self::build_router(config, site);
        Self {
            app: NormalizePathLayer::trim_trailing_slash().layer(router),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &SiteConfig, site: Site) -> Router {
        let routes = Router::new()
            .merge(crate::site::pages::routes(&site.pages))
            .merge(downloads::routes(&site.catalog, site.download_limiter))
            .merge(site.assets.router());
        Self::with_layers(config, routes, site.global_limiter)
    }

    /// Wrap `routes` in the global limiter and the shared middleware stack.
    #[allow(deprecated)]
    fn with_layers(
        config: &SiteConfig,
        routes: Router,
        global_limiter: Arc<RateLimiter>,
    ) -> Router {
        let routes = routes
            .layer(middleware::from_fn_with_state(
                global_limiter,
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        let routes = if config.security.enable_headers {
            headers::apply(routes)
        } else {
            routes
        };

        routes
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered app, for driving the site without a socket.
    pub fn app(&self) -> App {
        self.app.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app =
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(self.app);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
