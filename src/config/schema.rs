//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.
//! The defaults reproduce the deployed site, so an empty file (or no file
//! at all) is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the site server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Filesystem layout of the site.
    pub paths: PathsConfig,

    /// Page routes mapping URL paths to HTML documents.
    pub pages: PagesConfig,

    /// Download catalogue.
    pub downloads: DownloadsConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Static asset settings.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by the `PORT` environment variable.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Directory layout. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the static asset tree.
    pub public_dir: String,

    /// Directory holding the page documents.
    pub views_dir: String,

    /// Directory holding the downloadable builds.
    pub assets_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            views_dir: "views".to_string(),
            assets_dir: "public/private".to_string(),
        }
    }
}

/// A single page route.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageConfig {
    /// Exact URL path (e.g., "/aegis").
    pub path: String,

    /// Document file name under `paths.views_dir`.
    pub document: String,
}

/// Page routing table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PagesConfig {
    pub routes: Vec<PageConfig>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        let page = |path: &str, document: &str| PageConfig {
            path: path.to_string(),
            document: document.to_string(),
        };
        Self {
            routes: vec![
                page("/", "index.html"),
                page("/zr-music", "zr-music.html"),
                page("/aegis", "aegis.html"),
                page("/zr-studio", "zr-studio.html"),
            ],
        }
    }
}

/// A single gated download.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Opaque path segment under `/download/`.
    pub token: String,

    /// File on disk, relative to `paths.assets_dir` unless absolute.
    pub file: String,

    /// Filename presented to the client.
    pub display_name: String,
}

/// Download catalogue.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// URL prefix under which tokens are mounted.
    pub route_prefix: String,

    pub entries: Vec<DownloadConfig>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        let entry = |token: &str, file: &str| DownloadConfig {
            token: token.to_string(),
            file: file.to_string(),
            display_name: file.to_string(),
        };
        Self {
            route_prefix: "/download".to_string(),
            entries: vec![
                entry("zr-build-v1-9x82k", "ZR-Music-1.0.0.exe"),
                entry("zr-build-v2-9x82k", "ZR-Music-1.1.0.exe"),
                entry("zr-build-v3-installer", "ZR-Music-installer.zip"),
            ],
        }
    }
}

/// Window and cap of one limiter instance.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LimiterConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Maximum requests per client address within one window.
    pub max_requests: u32,

    /// Body of the 429 response.
    pub message: String,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Applies to every route.
    pub global: LimiterConfig,

    /// Applies to download routes only, on top of `global`.
    pub downloads: LimiterConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: LimiterConfig {
                window_secs: 15 * 60,
                max_requests: 200,
                message: "Too many requests. Please try again later.".to_string(),
            },
            downloads: LimiterConfig {
                window_secs: 10 * 60,
                max_requests: 10,
                message: "Too many downloads. Please wait a few minutes.".to_string(),
            },
        }
    }
}

/// Static asset settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// URL prefixes never served from the public tree.
    pub hidden_prefixes: Vec<String>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            hidden_prefixes: vec!["/private".to_string()],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce response headers, in seconds.
    /// Download bodies are not bounded by this.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
