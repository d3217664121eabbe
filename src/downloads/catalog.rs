//! Download catalogue: opaque token → asset on disk.
//!
//! Built once at startup and never mutated. Source paths are resolved to
//! absolute paths here, but existence is only checked per request.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::schema::DownloadsConfig;

/// One gated download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadEntry {
    token: String,
    source: PathBuf,
    display_name: String,
}

impl DownloadEntry {
    pub fn new(
        token: impl Into<String>,
        source: impl Into<PathBuf>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            source: source.into(),
            display_name: display_name.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Absolute location of the asset.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Filename the client saves the download as.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Immutable lookup table of every download.
#[derive(Debug, Clone)]
pub struct Catalog {
    route_prefix: String,
    entries: Vec<Arc<DownloadEntry>>,
    by_token: HashMap<String, Arc<DownloadEntry>>,
}

impl Catalog {
    /// Build from config, resolving relative files against `assets_dir`.
    pub fn from_config(config: &DownloadsConfig, assets_dir: &Path) -> io::Result<Self> {
        let entries = config
            .entries
            .iter()
            .map(|entry| {
                let source = std::path::absolute(assets_dir.join(&entry.file))?;
                Ok(DownloadEntry::new(&entry.token, source, &entry.display_name))
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self::new(&config.route_prefix, entries))
    }

    pub fn new(route_prefix: &str, entries: Vec<DownloadEntry>) -> Self {
        let entries: Vec<Arc<DownloadEntry>> = entries.into_iter().map(Arc::new).collect();
        let by_token = entries
            .iter()
            .map(|entry| (entry.token.clone(), Arc::clone(entry)))
            .collect();

        Self {
            route_prefix: route_prefix.trim_end_matches('/').to_string(),
            entries,
            by_token,
        }
    }

    pub fn get(&self, token: &str) -> Option<&Arc<DownloadEntry>> {
        self.by_token.get(token)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<DownloadEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Public URL path of `entry`.
    pub fn route_path(&self, entry: &DownloadEntry) -> String {
        format!("{}/{}", self.route_prefix, entry.token)
    }
}
