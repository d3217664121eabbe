//! Swapping the limiter store behind the site.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};

use zr_portfolio::http::HttpServer;
use zr_portfolio::security::{Decision, RateLimitStore, RateLimiter};
use zr_portfolio::site::Site;

mod common;
use common::{client, get, TestSite};

/// Refuses everyone, counting how often it was asked.
#[derive(Default)]
struct ClosedStore {
    attempts: AtomicU32,
}

impl RateLimitStore for ClosedStore {
    fn record_attempt(&self, _client: IpAddr) -> Decision {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Decision::Denied {
            limit: 1,
            retry_after: Duration::from_secs(42),
        }
    }

    fn is_allowed(&self, _client: IpAddr) -> bool {
        false
    }
}

/// Lets everyone through.
struct OpenStore;

impl RateLimitStore for OpenStore {
    fn record_attempt(&self, _client: IpAddr) -> Decision {
        Decision::Allowed {
            limit: u32::MAX,
            remaining: u32::MAX,
            reset_after: Duration::from_secs(1),
        }
    }

    fn is_allowed(&self, _client: IpAddr) -> bool {
        true
    }
}

#[tokio::test]
async fn injected_global_store_decides_on_first_request() {
    let site = TestSite::new();
    let closed = Arc::new(ClosedStore::default());

    let resolved = Site::from_config(&site.config).unwrap().with_limiters(
        Arc::new(RateLimiter::new("global", closed.clone(), "closed for now")),
        Arc::new(RateLimiter::new("downloads", Arc::new(OpenStore), "unused")),
    );
    let app = HttpServer::with_site(&site.config, resolved).app();

    let response = get(&app, "/", client(1)).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.text(), "closed for now");
    assert_eq!(response.headers[header::RETRY_AFTER], "42");
    assert_eq!(closed.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn injected_download_store_only_gates_downloads() {
    let site = TestSite::new();
    let closed = Arc::new(ClosedStore::default());

    let resolved = Site::from_config(&site.config).unwrap().with_limiters(
        Arc::new(RateLimiter::new("global", Arc::new(OpenStore), "unused")),
        Arc::new(RateLimiter::new("downloads", closed.clone(), "no downloads today")),
    );
    let app = HttpServer::with_site(&site.config, resolved).app();

    let response = get(&app, "/download/zr-build-v1-9x82k", client(1)).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.text(), "no downloads today");

    assert_eq!(get(&app, "/aegis", client(1)).await.status, StatusCode::OK);
    assert_eq!(closed.attempts.load(Ordering::SeqCst), 1);
}
