//! Page routes: fixed URL paths served as verbatim HTML documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{response::Html, routing::get, Router};

use crate::config::schema::PageConfig;
use crate::http::error::{not_found, AppError};

/// A page route bound to its document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: String,
    pub document: PathBuf,
}

impl Page {
    pub fn from_config(config: &PageConfig, views_dir: &Path) -> Self {
        Self {
            path: config.path.clone(),
            document: views_dir.join(&config.document),
        }
    }
}

/// One `GET` route per page. Other methods fall through to the 404.
pub fn routes<S>(pages: &[Page]) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    pages.iter().fold(Router::new(), |router, page| {
        let document: Arc<Path> = Arc::from(page.document.as_path());
        router.route(
            &page.path,
            get(move || render(Arc::clone(&document))).fallback(not_found),
        )
    })
}

async fn render(document: Arc<Path>) -> Result<Html<Vec<u8>>, AppError> {
    let bytes = tokio::fs::read(&*document)
        .await
        .map_err(|source| AppError::Page {
            path: document.to_path_buf(),
            source,
        })?;
    Ok(Html(bytes))
}
