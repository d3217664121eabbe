//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Keep download tokens opaque and unique
//! - Validate value ranges (windows and caps > 0, timeouts > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::{LimiterConfig, SiteConfig};
use crate::security::rate_limit::MAX_WINDOW;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("page path {0:?} must start with '/'")]
    PagePathNotAbsolute(String),

    #[error("page path {0:?} is declared more than once")]
    DuplicatePagePath(String),

    #[error("page {path:?} has an invalid document name {document:?}")]
    InvalidDocument { path: String, document: String },

    #[error("page path {0:?} collides with the download route prefix")]
    PageShadowsDownloads(String),

    #[error("download route prefix {0:?} must start with '/' and not end with '/'")]
    InvalidRoutePrefix(String),

    #[error("download token {0:?} must be a non-empty path segment of [A-Za-z0-9_-]")]
    InvalidToken(String),

    #[error("download token {0:?} is declared more than once")]
    DuplicateToken(String),

    #[error("download token {token:?} is derived from its file name {file:?}")]
    TokenRevealsFile { token: String, file: String },

    #[error("download {token:?} has an invalid display name {display_name:?}")]
    InvalidDisplayName { token: String, display_name: String },

    #[error("download {0:?} has an empty file path")]
    EmptyFile(String),

    #[error("rate limiter {0:?} needs a positive window and cap")]
    InvalidLimiter(&'static str),

    #[error("rate limiter {0:?} window exceeds {max} seconds", max = MAX_WINDOW.as_secs())]
    WindowTooLong(&'static str),

    #[error("hidden static prefix {0:?} must start with '/'")]
    InvalidHiddenPrefix(String),

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_pages(config, &mut errors);
    validate_downloads(config, &mut errors);
    validate_limiter("global", &config.rate_limit.global, &mut errors);
    validate_limiter("downloads", &config.rate_limit.downloads, &mut errors);

    for prefix in &config.static_files.hidden_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::InvalidHiddenPrefix(prefix.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_pages(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let prefix = config.downloads.route_prefix.as_str();
    let mut seen = HashSet::new();

    for page in &config.pages.routes {
        if !page.path.starts_with('/') {
            errors.push(ValidationError::PagePathNotAbsolute(page.path.clone()));
        }
        if !seen.insert(page.path.as_str()) {
            errors.push(ValidationError::DuplicatePagePath(page.path.clone()));
        }
        if !is_plain_file_name(&page.document) {
            errors.push(ValidationError::InvalidDocument {
                path: page.path.clone(),
                document: page.document.clone(),
            });
        }
        if page.path == prefix || page.path.starts_with(&format!("{prefix}/")) {
            errors.push(ValidationError::PageShadowsDownloads(page.path.clone()));
        }
    }
}

fn validate_downloads(config: &SiteConfig, errors: &mut Vec<ValidationError>) {
    let prefix = &config.downloads.route_prefix;
    if !prefix.starts_with('/') || prefix.ends_with('/') {
        errors.push(ValidationError::InvalidRoutePrefix(prefix.clone()));
    }

    let mut seen = HashSet::new();
    for entry in &config.downloads.entries {
        let token = &entry.token;

        if !is_token(token) {
            errors.push(ValidationError::InvalidToken(token.clone()));
        }
        if !seen.insert(token.as_str()) {
            errors.push(ValidationError::DuplicateToken(token.clone()));
        }
        if entry.file.trim().is_empty() {
            errors.push(ValidationError::EmptyFile(token.clone()));
        } else if reveals(token, &entry.file) || reveals(token, &entry.display_name) {
            errors.push(ValidationError::TokenRevealsFile {
                token: token.clone(),
                file: entry.file.clone(),
            });
        }
        if !is_plain_file_name(&entry.display_name) {
            errors.push(ValidationError::InvalidDisplayName {
                token: token.clone(),
                display_name: entry.display_name.clone(),
            });
        }
    }
}

fn validate_limiter(
    name: &'static str,
    limiter: &LimiterConfig,
    errors: &mut Vec<ValidationError>,
) {
    if limiter.window_secs == 0 || limiter.max_requests == 0 {
        errors.push(ValidationError::InvalidLimiter(name));
    }
    if limiter.window_secs > MAX_WINDOW.as_secs() {
        errors.push(ValidationError::WindowTooLong(name));
    }
}

fn is_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}

/// True when the token embeds the stem of `file` (case-insensitive).
/// Stems shorter than three characters are too common to count.
fn reveals(token: &str, file: &str) -> bool {
    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    stem.len() >= 3 && token.to_lowercase().contains(&stem)
}
