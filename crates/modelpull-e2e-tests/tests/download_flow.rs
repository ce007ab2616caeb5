use modelpull_e2e_tests::{
    StubMirror, encoded_resolve_path, init_tracing, read_to_string, write_config_file,
};
use modelpull_lib::ModelPullError;
use modelpull_lib::cli::{Command, DownloadParams, ResolvedCommand, resolve_command, run_download};
use modelpull_lib::download::{
    DownloadExecutor, ExecuteOptions, HttpTransport, TaskOutcome, Transport,
};
use modelpull_lib::plan::DownloadTask;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const REPO: &str = "org/tiny-model";
const CONFIG_JSON: &[u8] = br#"{"architectures": ["TinyModel"]}"#;
const WEIGHTS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const VOCAB: &[u8] = b"hello\nworld\n";

fn download_params(mirror: &StubMirror, output_dir: &Path) -> DownloadParams {
    download_params_with(mirror, output_dir, false)
}

fn download_params_with(mirror: &StubMirror, output_dir: &Path, no_update: bool) -> DownloadParams {
    let dir = output_dir.parent().expect("output dir has a parent");
    let config_path = write_config_file(dir, &mirror.server.uri()).expect("config is written");

    let command = Command::Download {
        config_path: Some(config_path.display().to_string()),
        url: format!("{}/{}/tree/main", mirror.server.uri(), REPO),
        output_dir: Some(output_dir.display().to_string()),
        assume_yes: true,
        no_update,
        exclude_extensions: vec![],
        parallelism: None,
        max_retries: None,
        transport: None,
    };
    match resolve_command(command).expect("download command should resolve") {
        ResolvedCommand::Download(params) => params,
        _ => unreachable!("Resolved command type mismatch"),
    }
}

async fn mount_tiny_model(mirror: &StubMirror, weight_requests: u64) {
    let files = [
        ("file", "config.json"),
        ("file", "model.safetensors"),
        ("file", "flax_model.msgpack"),
        ("directory", "tokenizer"),
        ("file", "tokenizer/vocab.txt"),
    ];
    mirror
        .mount_listing_page(
            REPO,
            &["config.json", "model.safetensors", "flax_model.msgpack"],
            &files,
            None,
        )
        .await;

    mirror.mount_file(REPO, "config.json", CONFIG_JSON, &[], 1..).await;
    mirror
        .mount_file(REPO, "model.safetensors", WEIGHTS, &[], weight_requests)
        .await;
    mirror
        .mount_file(REPO, "tokenizer/vocab.txt", VOCAB, &[], 1..)
        .await;
    mirror
        .mount_file(REPO, "flax_model.msgpack", b"excluded", &[], 0)
        .await;
}

fn outcome_of<'a>(
    report: &'a modelpull_lib::download::ExecutionReport,
    path: &str,
) -> &'a TaskOutcome {
    &report
        .tasks
        .iter()
        .find(|task| task.task.path == path)
        .unwrap_or_else(|| panic!("no task for {path}"))
        .outcome
}

#[tokio::test]
async fn test_download_end_to_end() {
    init_tracing();
    let mirror = StubMirror::start().await;
    mount_tiny_model(&mirror, 1).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().join("tiny-model");

    let report = run_download(download_params(&mirror, &output_dir), CancellationToken::new())
        .await
        .expect("download should succeed");

    assert_eq!(report.transferred(), 3);
    assert_eq!(report.skipped(), 0);
    assert!(report.is_success());

    assert_eq!(read_to_string(&output_dir.join("config.json")).as_bytes(), CONFIG_JSON);
    assert_eq!(std::fs::read(output_dir.join("model.safetensors")).unwrap(), WEIGHTS);
    assert_eq!(
        read_to_string(&output_dir.join("tokenizer/vocab.txt")).as_bytes(),
        VOCAB
    );
    assert!(!output_dir.join("flax_model.msgpack").exists());
}

#[tokio::test]
async fn test_second_run_skips_existing_weights() {
    init_tracing();
    let mirror = StubMirror::start().await;
    mount_tiny_model(&mirror, 1).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().join("tiny-model");

    run_download(download_params(&mirror, &output_dir), CancellationToken::new())
        .await
        .expect("first download should succeed");
    let report = run_download(download_params(&mirror, &output_dir), CancellationToken::new())
        .await
        .expect("second download should succeed");

    assert!(matches!(
        outcome_of(&report, "model.safetensors"),
        TaskOutcome::Skipped
    ));
    assert!(matches!(
        outcome_of(&report, "config.json"),
        TaskOutcome::Transferred { .. }
    ));
    assert_eq!(std::fs::read(output_dir.join("model.safetensors")).unwrap(), WEIGHTS);
    assert_eq!(mirror.requests_for("model.safetensors").await, 1);
}

#[tokio::test]
async fn test_partial_weight_file_is_resumed() {
    init_tracing();
    let mirror = StubMirror::start().await;

    mirror
        .mount_listing_page(
            REPO,
            &["model.safetensors"],
            &[("file", "model.safetensors")],
            None,
        )
        .await;
    mirror
        .mount_file(REPO, "model.safetensors", WEIGHTS, &[10], 0)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().join("tiny-model");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(output_dir.join("model.safetensors"), &WEIGHTS[..10]).unwrap();

    let report = run_download(
        download_params_with(&mirror, &output_dir, true),
        CancellationToken::new(),
    )
    .await
    .expect("download should succeed");

    let TaskOutcome::Transferred {
        bytes_written,
        resumed,
        attempts,
    } = outcome_of(&report, "model.safetensors")
    else {
        panic!("model.safetensors should have been transferred");
    };
    assert!(*resumed);
    assert_eq!(*attempts, 1);
    assert_eq!(*bytes_written, (WEIGHTS.len() - 10) as u64);
    assert_eq!(std::fs::read(output_dir.join("model.safetensors")).unwrap(), WEIGHTS);
}

async fn run_with_local_config(mirror: &StubMirror, root: &Path, local: &[u8]) -> PathBuf {
    let output_dir = root.join("tiny-model");
    std::fs::create_dir_all(&output_dir).unwrap();
    std::fs::write(output_dir.join("config.json"), local).unwrap();

    run_download(download_params(mirror, &output_dir), CancellationToken::new())
        .await
        .expect("download should succeed");
    output_dir
}

#[tokio::test]
async fn test_edited_config_that_grew_is_replaced() {
    init_tracing();
    let mirror = StubMirror::start().await;
    let local = br#"{"a":1}"#;
    let upstream = br#"{"a":1,"b":2}"#;

    mirror
        .mount_listing_page(REPO, &["config.json"], &[("file", "config.json")], None)
        .await;
    mirror
        .mount_file(REPO, "config.json", upstream, &[local.len()], 1)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = run_with_local_config(&mirror, temp_dir.path(), local).await;

    assert_eq!(std::fs::read(output_dir.join("config.json")).unwrap(), upstream);
    assert_eq!(mirror.requests_with_range("config.json").await, 0);
}

#[tokio::test]
async fn test_edited_config_that_shrank_is_replaced() {
    init_tracing();
    let mirror = StubMirror::start().await;
    let local = br#"{"a":1,"b":2}"#;
    let upstream = br#"{"a":3}"#;

    mirror
        .mount_listing_page(REPO, &["config.json"], &[("file", "config.json")], None)
        .await;
    mirror.mount_unsatisfiable_range(REPO, "config.json").await;
    mirror.mount_file(REPO, "config.json", upstream, &[], 1).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = run_with_local_config(&mirror, temp_dir.path(), local).await;

    assert_eq!(std::fs::read(output_dir.join("config.json")).unwrap(), upstream);
    assert_eq!(mirror.requests_with_range("config.json").await, 0);
}

#[tokio::test]
async fn test_inconsistent_listing_downloads_nothing() {
    init_tracing();
    let mirror = StubMirror::start().await;

    mirror
        .mount_listing_page(
            REPO,
            &["config.json", "model.safetensors"],
            &[("file", "config.json")],
            None,
        )
        .await;
    mirror.mount_file(REPO, "config.json", CONFIG_JSON, &[], 0).await;
    mirror.mount_file(REPO, "model.safetensors", WEIGHTS, &[], 0).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().join("tiny-model");

    let err = run_download(download_params(&mirror, &output_dir), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ModelPullError::Consistency { .. }));
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_missing_file_fails_without_retrying() {
    init_tracing();
    let mirror = StubMirror::start().await;

    mirror
        .mount_listing_page(
            REPO,
            &["config.json", "gone.bin"],
            &[("file", "config.json"), ("file", "gone.bin")],
            None,
        )
        .await;
    mirror.mount_file(REPO, "config.json", CONFIG_JSON, &[], 1).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_dir = temp_dir.path().join("tiny-model");

    let err = run_download(download_params(&mirror, &output_dir), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ModelPullError::TransfersFailed { failed: 1, total: 2 }
    ));
    assert_eq!(mirror.requests_for("gone.bin").await, 1);
    assert_eq!(read_to_string(&output_dir.join("config.json")).as_bytes(), CONFIG_JSON);
}

#[tokio::test]
async fn test_http_transport_treats_unsatisfiable_range_as_complete() {
    init_tracing();
    let mirror = StubMirror::start().await;

    Mock::given(method("GET"))
        .and(path(encoded_resolve_path(REPO, "done.bin")))
        .respond_with(ResponseTemplate::new(416))
        .expect(1)
        .mount(&mirror.server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let destination = temp_dir.path().join("done.bin");
    std::fs::write(&destination, WEIGHTS).unwrap();

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let url = mirror.listing_url(REPO).download_url("done.bin");
    let report = transport.fetch_with_resume(&url, &destination).await.unwrap();

    assert_eq!(report.bytes_written, 0);
    assert_eq!(report.total_size, Some(WEIGHTS.len() as u64));
    assert_eq!(std::fs::read(&destination).unwrap(), WEIGHTS);
}

#[tokio::test]
async fn test_http_transport_restarts_when_range_is_ignored() {
    init_tracing();
    let mirror = StubMirror::start().await;
    mirror.mount_file(REPO, "model.bin", WEIGHTS, &[], 1).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let destination = temp_dir.path().join("model.bin");
    std::fs::write(&destination, b"stale partial bytes").unwrap();

    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    let url = mirror.listing_url(REPO).download_url("model.bin");
    let report = transport.fetch_with_resume(&url, &destination).await.unwrap();

    assert!(!report.resumed);
    assert_eq!(report.bytes_written, WEIGHTS.len() as u64);
    assert_eq!(std::fs::read(&destination).unwrap(), WEIGHTS);
}

#[tokio::test]
async fn test_cancelled_run_transfers_nothing() {
    init_tracing();
    let mirror = StubMirror::start().await;
    mirror.mount_file(REPO, "model.bin", WEIGHTS, &[], 0).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = mirror.listing_url(REPO).download_url("model.bin");
    let tasks = vec![DownloadTask {
        path: "model.bin".to_string(),
        url,
        destination_path: temp_dir.path().join("model.bin"),
        skip: false,
        resume: true,
    }];

    let cancel = CancellationToken::new();
    cancel.cancel();
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap());
    let executor =
        DownloadExecutor::new(transport, ExecuteOptions::default()).with_cancellation(cancel);

    let report = executor.execute(temp_dir.path(), tasks, &true).await.unwrap();

    assert_eq!(report.cancelled(), 1);
    assert!(!report.is_success());
    assert!(!temp_dir.path().join("model.bin").exists());
}
