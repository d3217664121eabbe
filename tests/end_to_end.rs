//! Runs the real server on a local socket and talks to it over HTTP.

use std::time::Duration;

use zr_portfolio::http::HttpServer;
use zr_portfolio::lifecycle::Shutdown;

mod common;
use common::TestSite;

#[tokio::test]
async fn serves_over_tcp_and_shuts_down_gracefully() {
    // 1. Site on disk, server on an ephemeral port
    let mut site = TestSite::new();
    site.config.listener.host = "127.0.0.1".into();
    site.config.listener.port = 0;

    let listener = tokio::net::TcpListener::bind(site.config.listener.bind_address())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(site.config.clone()).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    // 2. Page, download and 404 over the wire
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let page = client.get(format!("{base}/zr-studio")).send().await.unwrap();
    assert_eq!(page.status(), 200);
    assert!(page.headers().contains_key("x-request-id"));
    assert!(page.text().await.unwrap().contains("ZR Studio"));

    let download = client
        .get(format!("{base}/download/zr-build-v1-9x82k"))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), 200);
    assert_eq!(
        download.headers()["content-disposition"],
        "attachment; filename=\"ZR-Music-1.0.0.exe\""
    );
    assert_eq!(download.bytes().await.unwrap().as_ref(), common::BUILD_V1);

    let missing = client.get(format!("{base}/missing")).send().await.unwrap();
    assert_eq!(missing.status(), 404);
    assert_eq!(missing.text().await.unwrap(), "404 - Page not found");

    // 3. Shutdown
    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
