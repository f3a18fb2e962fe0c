//! Self-update against a local HTTP server

use std::fs;
use std::path::Path;

use gentoo_update_core::config::SelfUpdateSettings;
use gentoo_update_core::patterns::INTEGRITY_LINE;
use gentoo_update_core::{Error, ProgramIdentity};
use gentoo_update_self::{HttpFetcher, PayloadFetcher, SelfUpdater, UpdateResult};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "gentoo-update-test";

fn settings(url: &str) -> SelfUpdateSettings {
    SelfUpdateSettings {
        url: url.to_string(),
        timeout_secs: 5,
        user_agent: USER_AGENT.to_string(),
        temp_dir: None,
    }
}

fn release(rev: &str) -> Vec<u8> {
    format!("#!/bin/false\n{}\nrev = {}\n", INTEGRITY_LINE, rev).into_bytes()
}

async fn serve(server: &MockServer, status: u16, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path("/gentoo-update"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .mount(server)
        .await;
}

fn run_update(url: String, root: &Path) -> gentoo_update_core::Result<UpdateResult> {
    let identity = ProgramIdentity::current("gentoo-update")?;
    let fetcher = HttpFetcher::new(&settings(&url))?.with_progress(false);
    SelfUpdater::with_fetcher(
        &identity,
        root.join("gentoo-update"),
        root.join("tmp"),
        url,
        Box::new(fetcher),
    )?
    .run()
}

fn installed_root() -> TempDir {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("gentoo-update"), b"original").unwrap();
    root
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_writes_body() {
    let server = MockServer::start().await;
    serve(&server, 200, b"payload bytes".to_vec()).await;
    let url = format!("{}/gentoo-update", server.uri());

    let (written, contents) = tokio::task::spawn_blocking(move || {
        let fetcher = HttpFetcher::new(&settings(&url)).unwrap().with_progress(false);
        let file = tempfile::NamedTempFile::new().unwrap();
        let written = fetcher.fetch(&url, &mut file.reopen().unwrap()).unwrap();
        (written, fs::read(file.path()).unwrap())
    })
    .await
    .unwrap();

    assert_eq!(written, 13);
    assert_eq!(contents, b"payload bytes");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_error_status_is_network_error() {
    let server = MockServer::start().await;
    serve(&server, 404, b"Not Found".to_vec()).await;
    let url = format!("{}/gentoo-update", server.uri());

    let result = tokio::task::spawn_blocking(move || {
        let fetcher = HttpFetcher::new(&settings(&url)).unwrap().with_progress(false);
        let mut file = tempfile::tempfile().unwrap();
        fetcher.fetch(&url, &mut file)
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(Error::Network { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_newer_release_is_installed() {
    let server = MockServer::start().await;
    serve(&server, 200, release("99.0")).await;
    let url = format!("{}/gentoo-update", server.uri());
    let root = installed_root();
    let root_path = root.path().to_path_buf();

    let result = tokio::task::spawn_blocking(move || run_update(url, &root_path))
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(result, UpdateResult::Updated { .. }));
    assert_eq!(
        fs::read(root.path().join("gentoo-update")).unwrap(),
        release("99.0")
    );
    assert!(!root.path().join("gentoo-update.old").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_restores_program() {
    let server = MockServer::start().await;
    serve(&server, 500, Vec::new()).await;
    let url = format!("{}/gentoo-update", server.uri());
    let root = installed_root();
    let root_path = root.path().to_path_buf();

    let result = tokio::task::spawn_blocking(move || run_update(url, &root_path))
        .await
        .unwrap();

    assert!(matches!(result, Err(Error::Network { .. })));
    assert_eq!(
        fs::read(root.path().join("gentoo-update")).unwrap(),
        b"original"
    );
    assert!(!root.path().join("gentoo-update.old").exists());
    assert_eq!(fs::read_dir(root.path().join("tmp")).unwrap().count(), 0);
}
