//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ZR_CONFIG file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply PORT)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → consumed once at startup by the HTTP server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    DownloadConfig, LimiterConfig, ListenerConfig, PageConfig, RateLimitConfig, SiteConfig,
};
pub use validation::{validate_config, ValidationError};
