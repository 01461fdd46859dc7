//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full mirror cycle end-to-end against a temporary download directory.

use mirror_crawl::config::{parse_config, Config};
use mirror_crawl::crawler::Coordinator;
use mirror_crawl::output::{ProgressEvent, ProgressReporter, SilentReporter};
use mirror_crawl::storage::load_checkpoint;
use mirror_crawl::{MirrorError, RunReport, TerminationReason};
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

fn file(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(content.as_bytes().to_vec(), "text/plain")
}

async fn mount(server: &MockServer, at: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

fn root(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

/// Directory the server's files are mirrored under
fn host_dir(server: &MockServer, dir: &TempDir) -> PathBuf {
    dir.path().join(server.uri().trim_start_matches("http://"))
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::for_root(root(server));
    config.crawl.container_id = Some("files".to_string());
    config.crawl.concurrency = 4;
    config.output.download_path = dir.path().to_path_buf();
    config
}

async fn run(config: Config) -> RunReport {
    let mut coordinator = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_reporter(SilentReporter);
    coordinator
        .run(&mut || -> bool { panic!("no interrupt expected") })
        .await
        .expect("Crawl failed")
}

/// Mounts the two-level listing: `/` has a.txt and sub/, sub/ has b.txt
async fn mount_listing(server: &MockServer, file_hits: u64, page_hits: u64) {
    mount(
        server,
        "/",
        html(
            r#"<nav><a href="/about.txt">About</a></nav>
            <table id="files">
                <tr><td><a href="a.txt">a.txt</a></td></tr>
                <tr><td><a href="sub/">sub/</a></td></tr>
            </table>"#,
        ),
        page_hits,
    )
    .await;

    mount(
        server,
        "/sub/",
        html(&format!(
            r#"<div id="files">
                <a href="{}">Parent</a>
                <a href="b.txt">b.txt</a>
            </div>"#,
            root(server)
        )),
        page_hits,
    )
    .await;

    mount(server, "/a.txt", file("alpha"), file_hits).await;
    mount(server, "/sub/b.txt", file("bravo"), file_hits).await;
    mount(server, "/about.txt", file("outside"), 0).await;
}

#[tokio::test]
async fn test_mirrors_listing_tree() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_listing(&server, 1, 1).await;

    let report = run(test_config(&server, &dir)).await;

    assert_eq!(report.reason, TerminationReason::Completed);
    assert_eq!(report.pages, 2);
    assert_eq!(report.files_written, 2);
    assert_eq!(report.completed, 4);
    assert_eq!(report.pending, 0);

    let host = host_dir(&server, &dir);
    assert_eq!(std::fs::read_to_string(host.join("a.txt")).unwrap(), "alpha");
    assert_eq!(
        std::fs::read_to_string(host.join("sub/b.txt")).unwrap(),
        "bravo"
    );
    assert!(!host.join("about.txt").exists());
    assert!(!host.join("index").exists());
}

#[tokio::test]
async fn test_no_recursion_stays_on_root() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        html(r#"<div id="files"><a href="a.txt">a</a><a href="sub/">sub</a></div>"#),
        1,
    )
    .await;
    mount(&server, "/a.txt", file("alpha"), 1).await;
    mount(&server, "/sub/", html(""), 0).await;

    let mut config = test_config(&server, &dir);
    config.crawl.no_recursion = true;
    let report = run(config).await;

    assert_eq!(report.pages, 1);
    assert_eq!(report.files_written, 1);
    assert!(host_dir(&server, &dir).join("a.txt").exists());
    assert!(!host_dir(&server, &dir).join("sub").exists());
}

#[tokio::test]
async fn test_second_run_skips_existing_files() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_listing(&server, 1, 2).await;

    let first = run(test_config(&server, &dir)).await;
    assert_eq!(first.files_written, 2);

    let second = run(test_config(&server, &dir)).await;
    assert_eq!(second.files_written, 0);
    assert_eq!(second.files_skipped, 2);
    assert_eq!(second.pages, 2);
}

#[tokio::test]
async fn test_overwrite_downloads_again() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_listing(&server, 2, 2).await;

    run(test_config(&server, &dir)).await;

    let mut config = test_config(&server, &dir);
    config.output.overwrite = true;
    let report = run(config).await;
    assert_eq!(report.files_written, 2);
    assert_eq!(report.files_skipped, 0);
}

#[tokio::test]
async fn test_self_linking_page_is_fetched_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        html(r#"<div id="files"><a href="/">home</a><a href="./">here</a></div>"#),
        1,
    )
    .await;

    let report = run(test_config(&server, &dir)).await;
    assert_eq!(report.pages, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.rounds, 1);
}

#[tokio::test]
async fn test_missing_container_yields_no_links() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(&server, "/", html(r#"<a href="a.txt">a</a>"#), 1).await;
    mount(&server, "/a.txt", file("alpha"), 0).await;

    let report = run(test_config(&server, &dir)).await;
    assert_eq!(report.completed, 1);
    assert_eq!(report.files_written, 0);
}

#[tokio::test]
async fn test_empty_container_id_in_config_file_scans_whole_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(&server, "/", html(r#"<a href="a.txt">a</a>"#), 1).await;
    mount(&server, "/a.txt", file("alpha"), 1).await;

    let mut config = parse_config(&format!(
        "[crawl]\nroot-url = \"{}\"\ncontainer-id = \"\"\n",
        root(&server)
    ))
    .unwrap();
    config.output.download_path = dir.path().to_path_buf();

    let report = run(config).await;
    assert_eq!(report.files_written, 1);
    assert_eq!(report.completed, 2);
    assert!(host_dir(&server, &dir).join("a.txt").exists());
}

#[tokio::test]
async fn test_root_without_trailing_slash_is_fetched_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        html(r#"<div id="files"><a href="/">home</a><a href="a.txt">a</a></div>"#),
        1,
    )
    .await;
    mount(&server, "/a.txt", file("alpha"), 1).await;

    let mut config = test_config(&server, &dir);
    config.crawl.root_url = server.uri();
    let report = run(config).await;

    assert_eq!(report.pages, 1);
    assert_eq!(report.files_written, 1);
    assert_eq!(report.rounds, 2);
}

#[tokio::test]
async fn test_file_and_directory_collision_aborts_with_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        html(r#"<div id="files"><a href="docs">docs</a><a href="docs/x.pdf">x</a></div>"#),
        1,
    )
    .await;
    mount(&server, "/docs/x.pdf", file("pdf"), 1).await;
    mount(&server, "/docs", file("listing"), 1).await;

    let mut config = test_config(&server, &dir);
    config.crawl.concurrency = 1;
    let checkpoint_path = config.checkpoint_path();

    let mut coordinator = Coordinator::new(config)
        .unwrap()
        .with_reporter(SilentReporter);
    let result = coordinator
        .run(&mut || -> bool { panic!("no interrupt expected") })
        .await;
    assert!(matches!(result, Err(MirrorError::Filesystem { .. })));

    let checkpoint = load_checkpoint(&checkpoint_path).unwrap().unwrap();
    assert_eq!(
        checkpoint.frontier.iter().collect::<Vec<_>>(),
        vec![format!("{}docs", root(&server))]
    );
    assert_eq!(checkpoint.completed_count, 2);
}

#[tokio::test]
async fn test_unreachable_root_is_abandoned() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let mut config = Config::for_root(format!("http://127.0.0.1:{}/", port));
    config.output.download_path = dir.path().to_path_buf();
    config.crawl.max_retries = 1;

    let report = run(config).await;
    assert_eq!(report.reason, TerminationReason::Completed);
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.completed, 0);
    assert_eq!(report.rounds, 2);
}

#[tokio::test]
async fn test_cookies_are_sent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "session=abc; theme=dark"))
        .respond_with(html(r#"<div id="files"><a href="a.txt">a</a></div>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.txt"))
        .and(header("cookie", "session=abc; theme=dark"))
        .respond_with(file("alpha"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server, &dir);
    config.crawl.max_retries = 1;
    config
        .http
        .cookies
        .insert("session".to_string(), "abc".to_string());
    config
        .http
        .cookies
        .insert("theme".to_string(), "dark".to_string());

    let report = run(config).await;
    assert_eq!(report.files_written, 1);
    assert_eq!(report.abandoned, 0);
}

#[tokio::test]
async fn test_failing_file_is_abandoned_after_retries() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount(
        &server,
        "/",
        html(r#"<div id="files"><a href="gone.txt">gone</a></div>"#),
        1,
    )
    .await;
    mount(&server, "/gone.txt", ResponseTemplate::new(503), 3).await;

    let mut config = test_config(&server, &dir);
    config.crawl.max_retries = 2;
    let report = run(config).await;

    assert_eq!(report.reason, TerminationReason::Completed);
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.completed, 1);
    assert!(!host_dir(&server, &dir).join("gone.txt").exists());
}

/// Raises the interrupt flag when the given round starts
struct InterruptOnRound {
    round: u64,
    tx: watch::Sender<bool>,
}

impl ProgressReporter for InterruptOnRound {
    fn report(&self, event: ProgressEvent<'_>) {
        if let ProgressEvent::RoundStarted { round, .. } = event {
            if round == self.round {
                let _ = self.tx.send(true);
            }
        }
    }
}

/// `/` links x.txt, y/ and z.txt; y/ links w.txt; z.txt always fails
async fn mount_interrupt_site(server: &MockServer) {
    mount(
        server,
        "/",
        html(r#"<div id="files"><a href="x.txt">x</a><a href="y/">y</a><a href="z.txt">z</a></div>"#),
        1,
    )
    .await;
    mount(
        server,
        "/y/",
        html(r#"<div id="files"><a href="w.txt">w</a></div>"#),
        1,
    )
    .await;
    mount(server, "/x.txt", file("x-ray"), 1).await;
    mount(server, "/z.txt", ResponseTemplate::new(500), 1).await;
    mount(server, "/y/w.txt", file("whiskey"), 0).await;
}

async fn run_interrupted(config: Config, save: bool) -> RunReport {
    let (tx, rx) = watch::channel(false);
    let mut coordinator = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_reporter(InterruptOnRound { round: 2, tx })
        .with_interrupt(rx);
    coordinator.run(&mut || save).await.expect("Crawl failed")
}

#[tokio::test]
async fn test_interrupt_drains_round_and_saves() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_interrupt_site(&server).await;

    let mut config = test_config(&server, &dir);
    config.crawl.concurrency = 3;
    let checkpoint_path = config.checkpoint_path();

    let report = run_interrupted(config, true).await;
    assert_eq!(report.reason, TerminationReason::InterruptedAndSaved);
    assert_eq!(report.rounds, 2);
    assert_eq!(report.completed, 3);
    assert_eq!(report.pending, 2);

    let checkpoint = load_checkpoint(&checkpoint_path).unwrap().unwrap();
    let base = root(&server);
    assert_eq!(checkpoint.completed_count, 3);
    assert_eq!(
        checkpoint.frontier.iter().collect::<Vec<_>>(),
        vec![format!("{}z.txt", base), format!("{}y/w.txt", base)]
    );
    assert!(checkpoint.completed.contains(&format!("{}x.txt", base)));
    assert!(checkpoint.completed.contains(&format!("{}y/", base)));
    assert!(!checkpoint.completed.contains(&format!("{}z.txt", base)));
}

#[tokio::test]
async fn test_interrupt_can_discard_progress() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_interrupt_site(&server).await;

    let mut config = test_config(&server, &dir);
    config.crawl.concurrency = 3;
    let checkpoint_path = config.checkpoint_path();

    let report = run_interrupted(config, false).await;
    assert_eq!(report.reason, TerminationReason::InterruptedAndDiscarded);
    assert!(!checkpoint_path.exists());
}

#[tokio::test]
async fn test_resume_continues_saved_frontier() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_interrupt_site(&server).await;

    let mut config = test_config(&server, &dir);
    config.crawl.concurrency = 3;
    run_interrupted(config.clone(), true).await;

    server.verify().await;
    server.reset().await;
    mount(&server, "/", html(""), 0).await;
    mount(&server, "/y/", html(""), 0).await;
    mount(&server, "/x.txt", file("x-ray"), 0).await;
    mount(&server, "/z.txt", file("zulu"), 1).await;
    mount(&server, "/y/w.txt", file("whiskey"), 1).await;

    config.checkpoint.resume = true;
    let report = run(config).await;

    assert!(report.resumed);
    assert_eq!(report.reason, TerminationReason::Completed);
    assert_eq!(report.files_written, 2);
    assert_eq!(report.completed, 5);

    let host = host_dir(&server, &dir);
    assert_eq!(std::fs::read_to_string(host.join("z.txt")).unwrap(), "zulu");
    assert_eq!(
        std::fs::read_to_string(host.join("y/w.txt")).unwrap(),
        "whiskey"
    );
}

#[tokio::test]
async fn test_periodic_checkpoint_matches_final_state() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_listing(&server, 1, 1).await;

    let mut config = test_config(&server, &dir);
    config.checkpoint.backup_interval = 1;
    let checkpoint_path = config.checkpoint_path();
    run(config).await;

    let checkpoint = load_checkpoint(&checkpoint_path).unwrap().unwrap();
    assert!(checkpoint.frontier.is_empty());
    assert_eq!(checkpoint.completed_count, 4);
    assert_eq!(checkpoint.completed.len(), 4);
}
