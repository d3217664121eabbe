//! ZR portfolio site server library.
//!
//! Serves the marketing pages and public assets, and gates the build
//! downloads behind opaque tokens and a stricter per-IP rate limit.

pub mod config;
pub mod downloads;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod site;

pub use config::schema::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
