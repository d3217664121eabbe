//! Per-client-address rate limiting middleware.
//!
//! Each [`RateLimiter`] owns an independent [`RateLimitStore`]. The site
//! runs two of them: a global one layered over every route and a stricter
//! one layered over download routes only. A client's window opens with its
//! first counted request and resets once that window has elapsed.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::LimiterConfig;
use crate::observability::metrics;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Longest window a [`MemoryStore`] keeps; longer ones are clamped.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Outcome of counting one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_after: Duration,
    },
    Denied {
        limit: u32,
        retry_after: Duration,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Storage of per-client counters.
///
/// Implementations must be internally consistent under concurrent calls.
pub trait RateLimitStore: Send + Sync {
    /// Count one attempt for `client` and decide whether it may proceed.
    fn record_attempt(&self, client: IpAddr) -> Decision;

    /// Whether `client` is currently under its cap. Does not count.
    fn is_allowed(&self, client: IpAddr) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// In-memory store: one counter per client address, sharded by `DashMap`.
pub struct MemoryStore {
    window: Duration,
    max_requests: u32,
    clients: DashMap<IpAddr, Window>,
    last_prune: Mutex<Instant>,
}

impl MemoryStore {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window: window.min(MAX_WINDOW),
            max_requests,
            clients: DashMap::new(),
            last_prune: Mutex::new(Instant::now()),
        }
    }

    /// [`RateLimitStore::record_attempt`] against an explicit clock reading.
    pub fn record_attempt_at(&self, client: IpAddr, now: Instant) -> Decision {
        self.prune(now);

        let mut window = self.clients.entry(client).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });
        if now >= window.reset_at {
            *window = Window {
                count: 0,
                reset_at: now + self.window,
            };
        }

        let reset_after = window.reset_at.saturating_duration_since(now);
        if window.count >= self.max_requests {
            return Decision::Denied {
                limit: self.max_requests,
                retry_after: reset_after,
            };
        }

        window.count += 1;
        Decision::Allowed {
            limit: self.max_requests,
            remaining: self.max_requests - window.count,
            reset_after,
        }
    }

    /// [`RateLimitStore::is_allowed`] against an explicit clock reading.
    pub fn is_allowed_at(&self, client: IpAddr, now: Instant) -> bool {
        match self.clients.get(&client) {
            Some(window) => now >= window.reset_at || window.count < self.max_requests,
            None => true,
        }
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Drop expired windows, at most once per window length.
    fn prune(&self, now: Instant) {
        let Ok(mut last) = self.last_prune.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < self.window {
            return;
        }
        *last = now;
        self.clients.retain(|_, window| now < window.reset_at);
    }
}

impl RateLimitStore for MemoryStore {
    fn record_attempt(&self, client: IpAddr) -> Decision {
        self.record_attempt_at(client, Instant::now())
    }

    fn is_allowed(&self, client: IpAddr) -> bool {
        self.is_allowed_at(client, Instant::now())
    }
}

/// A named limiter: a store plus the fixed rejection message.
pub struct RateLimiter {
    name: &'static str,
    store: Arc<dyn RateLimitStore>,
    message: Arc<str>,
}

impl RateLimiter {
    pub fn new(
        name: &'static str,
        store: Arc<dyn RateLimitStore>,
        message: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            name,
            store,
            message: message.into(),
        }
    }

    /// In-memory limiter built from its config section.
    pub fn from_config(name: &'static str, config: &LimiterConfig) -> Self {
        let window = Duration::from_secs(config.window_secs);
        let store = MemoryStore::new(window, config.max_requests);
        Self::new(name, Arc::new(store), config.message.as_str())
    }

    fn reject(&self, limit: u32, retry_after: Duration) -> Response {
        let mut response =
            (StatusCode::TOO_MANY_REQUESTS, self.message.to_string()).into_response();
        let headers = response.headers_mut();
        headers.insert(header::RETRY_AFTER, HeaderValue::from(ceil_secs(retry_after)));
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(0u32));
        headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(retry_after)));
        response
    }
}

/// Identity of the client for limiting: the peer IP, with IPv4-mapped
/// IPv6 addresses folded back to IPv4.
pub fn client_key(addr: &SocketAddr) -> IpAddr {
    addr.ip().to_canonical()
}

/// Middleware function for per-address rate limiting.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&addr);

    match limiter.store.record_attempt(client) {
        Decision::Allowed {
            limit,
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            annotate(response.headers_mut(), limit, remaining, reset_after);
            response
        }
        Decision::Denied { limit, retry_after } => {
            tracing::debug!(client = %client, limiter = limiter.name, "Rate limit exceeded");
            metrics::record_rate_limited(limiter.name);
            limiter.reject(limit, retry_after)
        }
    }
}

/// Inner limiters run last on the way out, so keep what they wrote.
fn annotate(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: Duration) {
    if headers.contains_key(RATELIMIT_LIMIT) {
        return;
    }
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset_after)));
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
