//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use zr_portfolio::config::SiteConfig;
use zr_portfolio::http::App;
use zr_portfolio::HttpServer;

pub const BUILD_V1: &[u8] = b"MZ build one";
pub const INSTALLER: &[u8] = b"PK installer archive";

/// A site tree on disk plus a config pointing at it.
///
/// The `TempDir` must outlive the router built from `config`.
pub struct TestSite {
    pub dir: TempDir,
    pub config: SiteConfig,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let views = root.join("views");
        let public = root.join("public");
        let private = public.join("private");
        std::fs::create_dir_all(&views).unwrap();
        std::fs::create_dir_all(public.join("css")).unwrap();
        std::fs::create_dir_all(&private).unwrap();

        for (name, title) in [
            ("index.html", "ZR Home"),
            ("zr-music.html", "ZR Music"),
            ("aegis.html", "Aegis"),
            ("zr-studio.html", "ZR Studio"),
        ] {
            std::fs::write(views.join(name), format!("<h1>{title}</h1>")).unwrap();
        }

        std::fs::write(public.join("css/site.css"), "body{margin:0}").unwrap();
        std::fs::write(private.join("ZR-Music-1.0.0.exe"), BUILD_V1).unwrap();
        std::fs::write(private.join("ZR-Music-1.1.0.exe"), b"MZ build two").unwrap();
        std::fs::write(private.join("ZR-Music-installer.zip"), INSTALLER).unwrap();

        let mut config = SiteConfig::default();
        config.paths.public_dir = path_string(&public);
        config.paths.views_dir = path_string(&views);
        config.paths.assets_dir = path_string(&private);

        Self { dir, config }
    }

    pub fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }

    /// Fully layered app, as `HttpServer` would serve it.
    pub fn app(&self) -> App {
        HttpServer::new(self.config.clone()).unwrap().app()
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Client address used when a test does not care which one.
pub fn client(last: u8) -> SocketAddr {
    SocketAddr::from(([203, 0, 113, last], 40_000))
}

/// Request carrying the peer address the limiters key on.
pub fn request(method: Method, uri: &str, from: SocketAddr) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(from));
    request
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn send(app: &App, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap()
        .to_vec();
    TestResponse { status, headers, body }
}

pub async fn get(app: &App, uri: &str, from: SocketAddr) -> TestResponse {
    send(app, request(Method::GET, uri, from)).await
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install as the process-wide subscriber. Call once per test binary.
    pub fn install() -> Self {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_global_default(subscriber).unwrap();
        logs
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
