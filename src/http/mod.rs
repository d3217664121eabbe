//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, trace span)
//!     → [pages | downloads | static assets]
//!     → error.rs (404 fallback, generic 500)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod server;

pub use error::AppError;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{App, HttpServer, ServerError};
