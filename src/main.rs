//! ZR portfolio site server.
//!
//! ```text
//!     Client Request
//!     ──▶ request id ─▶ trace ─▶ security headers ─▶ global limiter ─┐
//!                                                                     │
//!         ┌───────────────────────────┬───────────────────────────────┤
//!         ▼                           ▼                               ▼
//!     page routes            /download/<token>                 static assets
//!     (views/*.html)         download limiter                  (public/, no
//!                            → existence check                  listing)
//!                            → attachment stream                    │
//!                                                                   ▼
//!                                                             404 fallback
//! ```
//!
//! Configuration comes from `PORT` (default 3000) and an optional TOML
//! file named by `ZR_CONFIG`.

use tokio::net::TcpListener;

use zr_portfolio::config;
use zr_portfolio::lifecycle::{signals, Shutdown};
use zr_portfolio::observability;
use zr_portfolio::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_from_env()?;

    observability::logging::init(&config.observability);

    tracing::info!("zr-portfolio v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        global_limit = config.rate_limit.global.max_requests,
        download_limit = config.rate_limit.downloads.max_requests,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        "Site available at http://localhost:{}",
        local_addr.port()
    );

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::forward_to(&shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
