//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (global per-IP limit)
//!     → [download routes only] rate_limit.rs (download per-IP limit)
//!     → Pass to handler
//! Outgoing response:
//!     → headers.rs (hardening headers)
//! ```
//!
//! # Design Decisions
//! - Limiters key on the peer address only; forwarded headers are ignored
//! - Hardening headers never replace one a handler already set

pub mod headers;
pub mod rate_limit;

pub use rate_limit::{Decision, MemoryStore, RateLimitStore, RateLimiter};
