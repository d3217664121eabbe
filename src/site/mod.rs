//! Site content: page documents and the public asset tree.
//!
//! # Data Flow
//! ```text
//! Request (no download route matched)
//!     → pages.rs (exact path → HTML document)
//!     → assets.rs (public tree, router fallback)
//!     → 404
//! ```

pub mod assets;
pub mod pages;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::downloads::Catalog;
use crate::security::RateLimiter;

pub use assets::StaticAssets;
pub use pages::Page;

/// Everything the router needs, resolved from config once at startup.
#[derive(Clone)]
pub struct Site {
    pub pages: Vec<Page>,
    pub assets: StaticAssets,
    pub catalog: Catalog,
    pub global_limiter: Arc<RateLimiter>,
    pub download_limiter: Arc<RateLimiter>,
}

impl Site {
    /// Resolve directories to absolute paths and build in-memory limiters.
    pub fn from_config(config: &SiteConfig) -> io::Result<Self> {
        let public_dir = absolute(&config.paths.public_dir)?;
        let views_dir = absolute(&config.paths.views_dir)?;
        let assets_dir = absolute(&config.paths.assets_dir)?;

        let pages = config
            .pages
            .routes
            .iter()
            .map(|page| Page::from_config(page, &views_dir))
            .collect();

        Ok(Self {
            pages,
            assets: StaticAssets::new(&public_dir, &config.static_files.hidden_prefixes),
            catalog: Catalog::from_config(&config.downloads, &assets_dir)?,
            global_limiter: Arc::new(RateLimiter::from_config("global", &config.rate_limit.global)),
            download_limiter: Arc::new(RateLimiter::from_config(
                "downloads",
                &config.rate_limit.downloads,
            )),
        })
    }

    /// Swap in other limiters, e.g. a shared store.
    pub fn with_limiters(
        mut self,
        global: Arc<RateLimiter>,
        downloads: Arc<RateLimiter>,
    ) -> Self {
        self.global_limiter = global;
        self.download_limiter = downloads;
        self
    }
}

fn absolute(path: &str) -> io::Result<PathBuf> {
    std::path::absolute(Path::new(path))
}
