use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use glassprobe_core::{rank, MeasureError, MeasureErrorKind};
use glassprobe_infra::{
    default_http_client, AlternateLinkResolver, HttpAlternateResolver, SinkDestination,
    StopSignal,
};
use glassprobe_pipeline::{
    measure_batch, measure_candidate, Candidate, ConfigError, FallbackOrchestrator,
    FallbackState, MeasureConfig, MeasurementSession, SilentProgress,
};
use tokio_util::sync::CancellationToken;

const FILE_SIZE: usize = 200_000;

#[derive(Default)]
struct Hits {
    file_gets: AtomicUsize,
    nolength_gets: AtomicUsize,
    page_gets: AtomicUsize,
}

type Shared = State<Arc<Hits>>;

async fn file_head() -> impl IntoResponse {
    [(header::CONTENT_LENGTH, FILE_SIZE.to_string())]
}

async fn file_get(State(hits): Shared) -> impl IntoResponse {
    hits.file_gets.fetch_add(1, Ordering::SeqCst);
    Body::from(vec![0xABu8; FILE_SIZE])
}

async fn slow_get() -> impl IntoResponse {
    let stream = futures::stream::unfold(0u32, |n| async move {
        if n >= 10_000 {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        Some((Ok::<_, std::io::Error>(Bytes::from(vec![1u8; 1024])), n + 1))
    });
    Body::from_stream(stream)
}

async fn nolength_get(State(hits): Shared) -> impl IntoResponse {
    hits.nolength_gets.fetch_add(1, Ordering::SeqCst);
    Body::from("data")
}

async fn page(State(hits): Shared, body: &'static str) -> impl IntoResponse {
    hits.page_gets.fetch_add(1, Ordering::SeqCst);
    body
}

async fn start_server() -> (SocketAddr, Arc<Hits>) {
    let hits = Arc::new(Hits::default());
    let app = Router::new()
        .route("/files/:name", get(file_get).head(file_head))
        .route(
            "/slow/:name",
            get(slow_get).head(|| async { [(header::CONTENT_LENGTH, "10000000")] }),
        )
        .route(
            "/broken/:name",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR })
                .head(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/tiny",
            get(file_get).head(|| async { [(header::CONTENT_LENGTH, "50")] }),
        )
        .route(
            "/nolength",
            get(nolength_get).head(|| async { StatusCode::OK }),
        )
        .route(
            "/companies/good",
            get(|s: Shared| page(s, r#"<a href="/about">About</a> <a href="/files/200.mb">200 MB</a>"#)),
        )
        .route(
            "/companies/empty",
            get(|s: Shared| page(s, r#"<a href="/about">About</a>"#)),
        )
        .route(
            "/companies/slow",
            get(|s: Shared| page(s, r#"<a href="/slow/2.mb">2 MB</a>"#)),
        )
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

fn config(percent_limit: u32, deadline: Duration) -> MeasureConfig {
    MeasureConfig {
        percent_limit,
        deadline,
        progress_interval: Duration::from_millis(20),
        ..Default::default()
    }
}

fn orchestrator(cfg: MeasureConfig) -> FallbackOrchestrator {
    let client = reqwest::Client::new();
    FallbackOrchestrator::new(client, cfg, Arc::new(SilentProgress))
}

fn session(cfg: MeasureConfig) -> MeasurementSession {
    MeasurementSession::new(reqwest::Client::new(), cfg, Arc::new(SilentProgress))
}

fn stop(deadline: Duration) -> StopSignal {
    StopSignal::new(CancellationToken::new(), deadline)
}

#[tokio::test]
async fn session_downloads_percentage_of_resource() {
    let (addr, hits) = start_server().await;
    let result = session(config(10, Duration::from_secs(5)))
        .measure(&format!("http://{addr}/files/200.mb"), &stop(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(result.bytes_transferred, 20_000);
    assert!(result.elapsed_seconds > 0.0);
    assert!(result.throughput_mbps > 0.0);
    assert_eq!(hits.file_gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_mirrors_bytes_to_file_sink() {
    let (addr, _hits) = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("sample.bin");
    let cfg = MeasureConfig {
        sink: SinkDestination::parse(out.to_str().unwrap()),
        ..config(50, Duration::from_secs(5))
    };

    let result = session(cfg)
        .measure(&format!("http://{addr}/files/200.mb"), &stop(Duration::from_secs(5)))
        .await
        .unwrap();

    assert_eq!(result.bytes_transferred, 100_000);
    assert_eq!(std::fs::read(&out).unwrap().len(), 100_000);
}

#[tokio::test]
async fn failed_probe_never_requests_the_body() {
    let (addr, hits) = start_server().await;
    let err = session(config(100, Duration::from_secs(5)))
        .measure(&format!("http://{addr}/nolength"), &stop(Duration::from_secs(5)))
        .await
        .unwrap_err();

    assert!(matches!(err, MeasureError::SizeUnknown(_)), "{err:?}");
    assert_eq!(hits.nolength_gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_target_fails_before_any_read() {
    let (addr, hits) = start_server().await;
    let err = session(config(1, Duration::from_secs(5)))
        .measure(&format!("http://{addr}/tiny"), &stop(Duration::from_secs(5)))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MeasureError::InvalidTarget {
            size: 50,
            percent_limit: 1
        }
    );
    assert_eq!(hits.file_gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn primary_timeout_falls_back_to_detail_page_link() {
    let (addr, _hits) = start_server().await;
    let report = orchestrator(config(100, Duration::from_millis(300)))
        .run(
            &format!("http://{addr}/slow/100.mb"),
            Some(&format!("http://{addr}/companies/good")),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Succeeded);
    assert!(report.outcome.succeeded);
    assert_eq!(report.outcome.link_used, format!("http://{addr}/files/200.mb"));
    assert_eq!(report.outcome.bytes_transferred, FILE_SIZE as u64);

    let primary = report.record.primary.unwrap();
    match primary.result {
        Err(MeasureError::DeadlineExceeded { bytes_read }) => assert!(bytes_read <= 10_000_000),
        other => panic!("expected primary deadline, got {other:?}"),
    }
}

#[tokio::test]
async fn primary_timeout_uses_direct_secondary_link() {
    let (addr, hits) = start_server().await;
    let secondary = format!("http://{addr}/files/100.mb");
    let report = orchestrator(config(100, Duration::from_millis(300)))
        .run(
            &format!("http://{addr}/slow/100.mb"),
            Some(&secondary),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Succeeded);
    assert_eq!(report.outcome.link_used, secondary);
    assert_eq!(hits.page_gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn client_timeout_on_primary_falls_back() {
    let (addr, _hits) = start_server().await;
    // The client gives up long before the session deadline.
    let client = default_http_client("glassprobe-test", Some(Duration::from_millis(400))).unwrap();
    let session = MeasurementSession::new(
        client.clone(),
        config(100, Duration::from_secs(30)),
        Arc::new(SilentProgress),
    );
    let orch = FallbackOrchestrator::with_resolver(
        session,
        Arc::new(HttpAlternateResolver::new(client)),
    );

    let secondary = format!("http://{addr}/files/alt.mb");
    let report = orch
        .run(
            &format!("http://{addr}/slow/100.mb"),
            Some(&secondary),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Succeeded);
    assert_eq!(report.outcome.link_used, secondary);
    assert_eq!(report.outcome.bytes_transferred, FILE_SIZE as u64);
    match report.record.primary.unwrap().result {
        Err(MeasureError::Transport { timeout: true, .. }) => {}
        other => panic!("expected client-side timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_deadline_does_not_panic() {
    let (addr, _hits) = start_server().await;
    let report = orchestrator(config(10, Duration::from_secs(u64::MAX)))
        .run(
            &format!("http://{addr}/files/100.mb"),
            None,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Succeeded);
    assert_eq!(report.outcome.bytes_transferred, 20_000);
}

#[tokio::test]
async fn non_timeout_failure_does_not_fall_back() {
    let (addr, hits) = start_server().await;
    let report = orchestrator(config(100, Duration::from_secs(5)))
        .run(
            &format!("http://{addr}/broken/100.mb"),
            Some(&format!("http://{addr}/companies/good")),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Failed);
    assert!(!report.outcome.succeeded);
    assert_eq!(report.outcome.measured_mbps(), None);
    assert_eq!(report.outcome.error_kind, Some(MeasureErrorKind::SizeUnknown));
    assert!(!report.record.fallback_attempted());
    assert_eq!(hits.page_gets.load(Ordering::SeqCst), 0);
    assert_eq!(hits.file_gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_alternate_is_terminal_failure() {
    let (addr, _hits) = start_server().await;
    let report = orchestrator(config(100, Duration::from_millis(300)))
        .run(
            &format!("http://{addr}/slow/100.mb"),
            Some(&format!("http://{addr}/companies/empty")),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Failed);
    assert_eq!(
        report.outcome.error_kind,
        Some(MeasureErrorKind::NoAlternateFound)
    );
    assert!(report.record.alternate.is_none());
}

#[tokio::test]
async fn timeout_without_companion_fails() {
    let (addr, _hits) = start_server().await;
    let primary = format!("http://{addr}/slow/100.mb");
    let report = orchestrator(config(100, Duration::from_millis(300)))
        .run(&primary, None, &CancellationToken::new())
        .await;

    assert_eq!(report.final_state, FallbackState::Failed);
    assert_eq!(report.outcome.link_used, primary);
    assert_eq!(
        report.outcome.error_kind,
        Some(MeasureErrorKind::DeadlineExceeded)
    );
}

#[tokio::test]
async fn companion_equal_to_primary_is_ignored() {
    let (addr, hits) = start_server().await;
    let primary = format!("http://{addr}/slow/100.mb");
    let report = orchestrator(config(100, Duration::from_millis(300)))
        .run(&primary, Some(&primary), &CancellationToken::new())
        .await;

    assert_eq!(report.final_state, FallbackState::Failed);
    assert_eq!(report.record.companion_link, None);
    assert_eq!(hits.page_gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn alternate_timeout_is_failure() {
    let (addr, _hits) = start_server().await;
    let report = orchestrator(config(100, Duration::from_millis(300)))
        .run(
            &format!("http://{addr}/slow/100.mb"),
            Some(&format!("http://{addr}/companies/slow")),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Failed);
    assert_eq!(report.outcome.link_used, format!("http://{addr}/slow/2.mb"));
    assert_eq!(
        report.outcome.error_kind,
        Some(MeasureErrorKind::DeadlineExceeded)
    );
}

#[tokio::test]
async fn user_cancellation_is_not_retried() {
    let (addr, hits) = start_server().await;
    let token = CancellationToken::new();
    token.cancel();

    let report = orchestrator(config(100, Duration::from_secs(5)))
        .run(
            &format!("http://{addr}/files/100.mb"),
            Some(&format!("http://{addr}/companies/good")),
            &token,
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Failed);
    assert_eq!(report.outcome.error_kind, Some(MeasureErrorKind::Cancelled));
    assert_eq!(hits.page_gets.load(Ordering::SeqCst), 0);
}

struct FixedResolver {
    link: String,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl AlternateLinkResolver for FixedResolver {
    async fn resolve_alternate(
        &self,
        _page: &str,
        _signal: &StopSignal,
    ) -> Result<String, MeasureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.link.clone())
    }
}

#[tokio::test]
async fn injected_resolver_is_used_for_detail_pages() {
    let (addr, hits) = start_server().await;
    let resolver = Arc::new(FixedResolver {
        link: format!("http://{addr}/files/injected.mb"),
        calls: AtomicUsize::new(0),
    });
    let cfg = config(100, Duration::from_millis(300));
    let orch = FallbackOrchestrator::with_resolver(session(cfg), resolver.clone());

    let report = orch
        .run(
            &format!("http://{addr}/slow/100.mb"),
            Some("https://directory.example/companies/7"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(report.final_state, FallbackState::Succeeded);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.outcome.link_used, format!("http://{addr}/files/injected.mb"));
    assert_eq!(hits.page_gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn batch_measures_all_and_ranks_successes() {
    let (addr, _hits) = start_server().await;
    let candidates = vec![
        Candidate {
            name: "broken".into(),
            location: "Nowhere".into(),
            hosting_url: String::new(),
            link: format!("http://{addr}/broken/1.mb"),
            companion: None,
        },
        Candidate {
            name: "good".into(),
            location: "Amsterdam".into(),
            hosting_url: "https://good.example".into(),
            link: format!("http://{addr}/files/1.mb"),
            companion: None,
        },
        Candidate {
            name: "recovered".into(),
            location: "Paris".into(),
            hosting_url: String::new(),
            link: format!("http://{addr}/slow/1.mb"),
            companion: Some(format!("http://{addr}/companies/good")),
        },
    ];

    let orch = orchestrator(config(100, Duration::from_millis(400)));
    let reports = measure_batch(&orch, candidates, 2, &CancellationToken::new()).await;
    assert_eq!(reports.len(), 3);

    let ranked = rank(reports, |r| &r.outcome);
    let mut names: Vec<_> = ranked.iter().map(|r| r.candidate.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["good", "recovered"]);
}

#[tokio::test]
async fn facade_rejects_invalid_percent() {
    let err = measure_candidate(
        "http://127.0.0.1:9/x.mb",
        None,
        0,
        5,
        "/dev/null",
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err, ConfigError::PercentLimit(0));
}

#[tokio::test]
async fn facade_measures_one_candidate() {
    let (addr, _hits) = start_server().await;
    let outcome = measure_candidate(
        &format!("http://{addr}/files/200.mb"),
        None,
        25,
        5,
        "/dev/null",
        &CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(outcome.succeeded);
    assert_eq!(outcome.bytes_transferred, 50_000);
}
