//! Static asset responder for the public tree.
//!
//! Mounted as the router fallback: it only sees requests no page or
//! download route matched. Directory requests never produce a listing or
//! an index document, hidden prefixes are never served, and every miss
//! ends in the fixed 404.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::error::not_found;

#[derive(Clone)]
pub struct StaticAssets {
    serve_dir: ServeDir,
    hidden_prefixes: Arc<[String]>,
}

impl StaticAssets {
    pub fn new(public_dir: &Path, hidden_prefixes: &[String]) -> Self {
        let hidden_prefixes = hidden_prefixes
            .iter()
            .map(|prefix| normalize(prefix))
            .collect::<Vec<_>>()
            .into();

        Self {
            serve_dir: ServeDir::new(public_dir).append_index_html_on_directories(false),
            hidden_prefixes,
        }
    }

    /// True when `path` (as sent, possibly percent-encoded) falls under a
    /// hidden prefix.
    pub fn is_hidden(&self, path: &str) -> bool {
        let path = normalize(&percent_decode_str(path).decode_utf8_lossy());
        self.hidden_prefixes.iter().any(|prefix| {
            path == *prefix
                || (path.starts_with(prefix.as_str()) && path[prefix.len()..].starts_with('/'))
        })
    }

    /// Router whose fallback serves the public tree.
    pub fn router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new().fallback(serve_static).with_state(self)
    }
}

async fn serve_static(State(assets): State<StaticAssets>, request: Request<Body>) -> Response {
    let method = request.method();
    if method != Method::GET && method != Method::HEAD {
        return not_found().await;
    }
    if assets.is_hidden(request.uri().path()) {
        tracing::debug!(path = %request.uri().path(), "Hidden static path requested");
        return not_found().await;
    }

    let response = match assets.serve_dir.oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    };

    match response.status() {
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => not_found().await,
        _ => response.map(Body::new).into_response(),
    }
}

/// Collapse empty and `.` segments so `//private/./x` compares as `/private/x`.
fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    fn public_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::create_dir_all(dir.path().join("private")).unwrap();
        std::fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("css/index.html"), "<p>index</p>").unwrap();
        std::fs::write(dir.path().join("private/build.exe"), "MZ").unwrap();
        dir
    }

    fn app(dir: &tempfile::TempDir) -> Router {
        StaticAssets::new(dir.path(), &["/private".to_string()]).router()
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn serves_files() {
        let dir = public_tree();
        let response = app(&dir)
            .oneshot(Request::builder().uri("/css/site.css").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    }

    #[tokio::test]
    async fn directories_never_list_or_index() {
        let dir = public_tree();
        for uri in ["/", "/css", "/css/"] {
            let (status, body) = get(app(&dir), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body, crate::http::error::NOT_FOUND_MESSAGE, "{uri}");
        }
    }

    #[tokio::test]
    async fn hidden_prefix_is_not_served() {
        let dir = public_tree();
        for uri in ["/private/build.exe", "/%70rivate/build.exe", "/./private/build.exe"] {
            let (status, _) = get(app(&dir), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn non_get_is_not_found() {
        let dir = public_tree();
        let response = app(&dir)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/css/site.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn hidden_matching_is_segment_aware() {
        let assets = StaticAssets::new(Path::new("."), &["/private".to_string()]);
        assert!(assets.is_hidden("/private"));
        assert!(assets.is_hidden("/private/x.zip"));
        assert!(!assets.is_hidden("/private-notes.txt"));
        assert!(!assets.is_hidden("/css/private"));
        assert!(assets.is_hidden("//private/x.zip"));
        assert!(assets.is_hidden("/%2Fprivate/x.zip"));
        assert!(!assets.is_hidden("/priv%41te/x.zip"));
        assert!(!assets.is_hidden("/%zz/private"));
    }
}
