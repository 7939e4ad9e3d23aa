//! Tests for the Together target

use super::client::{parse_retry_after, status_error};
use super::types::error_message;
use super::*;
use crate::datasets::{Dataset, JsonlConvos};
use crate::lora::LoraSettings;
use crate::UnfatError;
use reqwest::StatusCode;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CONVO: &str = r#"{"messages":[{"role":"user","content":"apply edit"},{"role":"assistant","content":"done"}]}"#;

/// In-memory backend recording every call
#[derive(Default)]
struct FakeApi {
    uploads: RefCell<Vec<String>>,
    requests: RefCell<Vec<FineTuneRequest>>,
}

impl FineTuneApi for FakeApi {
    fn upload_file(&self, path: &Path, file_name: &str) -> Result<FileObject, TogetherError> {
        assert!(path.is_file(), "uploaded file must exist on disk");
        let mut uploads = self.uploads.borrow_mut();
        uploads.push(file_name.to_string());
        Ok(FileObject {
            id: format!("file-{}", uploads.len()),
            filename: Some(file_name.to_string()),
            bytes: None,
        })
    }

    fn create_fine_tune(&self, request: &FineTuneRequest) -> Result<FineTuneJob, TogetherError> {
        self.requests.borrow_mut().push(request.clone());
        Ok(FineTuneJob {
            id: "ft-123".to_string(),
            status: JobStatus::Pending,
            model: Some(request.model.clone()),
            output_name: None,
            created_at: None,
            updated_at: None,
        })
    }

    fn fine_tune(&self, id: &str) -> Result<FineTuneJob, TogetherError> {
        Err(TogetherError::NotFound {
            what: id.to_string(),
        })
    }

    fn cancel_fine_tune(&self, id: &str) -> Result<FineTuneJob, TogetherError> {
        self.fine_tune(id)
    }
}

fn fast_apply_config(dir: &Path, with_eval: bool) -> TogetherConfig {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("train.jsonl"), format!("{CONVO}\n{CONVO}\n")).unwrap();
    std::fs::write(data.join("eval.jsonl"), format!("{CONVO}\n")).unwrap();
    let eval = if with_eval {
        vec![JsonlConvos::new(data.join("eval.jsonl"))]
    } else {
        vec![]
    };
    llama_3_1_8b_together(
        dir.join("output"),
        Dataset::new(vec![JsonlConvos::new(data.join("train.jsonl"))], eval),
        LoraSettings::new(32, 16, 0.01, 8, 4e-4)
            .with_evals_per_epoch(2)
            .with_wandb("octofriend-fast-apply", "wandb-secret"),
        "together-secret",
    )
}

fn uploaded(eval: bool) -> UploadedFiles {
    let file = |id: &str| UploadedFile {
        id: id.to_string(),
        file_name: "x.jsonl".to_string(),
        sha256: "00".to_string(),
        cached: false,
    };
    UploadedFiles {
        train: file("file-train"),
        eval: eval.then(|| file("file-eval")),
    }
}

// ─── Upload flow ─────────────────────────────────────────────────────

#[test]
fn test_upload_files_uploads_both_splits() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), true);
    let api = FakeApi::default();

    let files = config.upload_files_with(&api).unwrap();

    assert_eq!(files.train.id, "file-1");
    assert_eq!(files.eval.as_ref().unwrap().id, "file-2");
    assert!(!files.train.cached);
    assert_eq!(*api.uploads.borrow(), vec!["train.jsonl", "eval.jsonl"]);
    assert!(dir.path().join("output/train.jsonl").is_file());
    assert!(dir.path().join("output").join(UPLOAD_CACHE_FILE).is_file());
}

#[test]
fn test_upload_files_reuses_cache() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), true);
    let api = FakeApi::default();

    let first = config.upload_files_with(&api).unwrap();
    let second = config.upload_files_with(&api).unwrap();

    assert_eq!(api.uploads.borrow().len(), 2);
    assert_eq!(first.train.id, second.train.id);
    assert!(second.train.cached);
    assert!(second.eval.unwrap().cached);
}

#[test]
fn test_upload_cache_is_scoped_to_endpoint() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), false);
    let api = FakeApi::default();

    config.upload_files_with(&api).unwrap();
    let other = config.clone().with_base_url("https://proxy.example/v1/");
    let files = other.upload_files_with(&api).unwrap();

    assert!(!files.train.cached);
    assert_eq!(api.uploads.borrow().len(), 2);
}

#[test]
fn test_upload_without_eval() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), false);
    let files = config.upload_files_with(&FakeApi::default()).unwrap();
    assert!(files.eval.is_none());
}

#[test]
fn test_upload_rejects_missing_key_before_io() {
    let dir = TempDir::new().unwrap();
    let mut config = fast_apply_config(dir.path(), true);
    config.api_key = String::new();

    let err = config.upload_files_with(&FakeApi::default()).unwrap_err();
    assert!(matches!(err, UnfatError::Together(TogetherError::AuthRequired)));
    assert!(!dir.path().join("output").exists());
}

// ─── Fine-tune request ───────────────────────────────────────────────

#[test]
fn test_request_maps_lora_settings() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), true);
    let request = config.request(&uploaded(true));

    assert_eq!(request.training_file, "file-train");
    assert_eq!(request.validation_file.as_deref(), Some("file-eval"));
    assert_eq!(request.model, "meta-llama/Meta-Llama-3.1-8B-Instruct-Reference");
    assert_eq!(request.n_epochs, 8);
    assert_eq!(request.n_evals, Some(16));
    assert!(request.lora);
    assert_eq!(request.lora_r, 32);
    assert_eq!(request.lora_alpha, 16);
    assert_eq!(request.lora_trainable_modules, "all-linear");
    assert_eq!(
        request.wandb_project_name.as_deref(),
        Some("octofriend-fast-apply")
    );
}

#[test]
fn test_request_without_eval_has_no_n_evals() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), false);
    let request = config.request(&uploaded(false));
    assert!(request.validation_file.is_none());
    assert!(request.n_evals.is_none());

    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("validation_file").is_none());
    assert!(json.get("n_evals").is_none());
}

#[test]
fn test_request_debug_hides_wandb_key() {
    let dir = TempDir::new().unwrap();
    let request = fast_apply_config(dir.path(), true).request(&uploaded(true));
    assert!(!format!("{request:?}").contains("wandb-secret"));
    assert_eq!(
        serde_json::to_value(&request).unwrap()["wandb_api_key"],
        "wandb-secret"
    );
}

#[test]
fn test_finetune_writes_job_record() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), true);
    let api = FakeApi::default();

    let files = config.upload_files_with(&api).unwrap();
    let job = config.finetune_with(&api, &files).unwrap();

    assert_eq!(job.id, "ft-123");
    assert_eq!(api.requests.borrow().len(), 1);

    let record = JobRecord::load(&dir.path().join("output")).unwrap();
    assert_eq!(record.job_id, "ft-123");
    assert_eq!(record.files, files);
    assert_eq!(record.status, JobStatus::Pending);
}

// ─── Options ─────────────────────────────────────────────────────────

#[test]
fn test_suffix_validation() {
    assert!(validate_suffix("fast-apply_v2").is_ok());
    assert!(validate_suffix("").is_err());
    assert!(validate_suffix("has space").is_err());
    assert!(validate_suffix(&"x".repeat(41)).is_err());
}

#[test]
fn test_warmup_ratio_validation() {
    let dir = TempDir::new().unwrap();
    let config = fast_apply_config(dir.path(), true).with_warmup_ratio(1.5);
    assert!(matches!(
        config.validate(),
        Err(UnfatError::Together(TogetherError::InvalidOption { .. }))
    ));
}

#[test]
fn test_debug_hides_api_key() {
    let dir = TempDir::new().unwrap();
    let debug = format!("{:?}", fast_apply_config(dir.path(), true));
    assert!(!debug.contains("together-secret"));
    assert!(!debug.contains("wandb-secret"));
}

// ─── HTTP helpers ────────────────────────────────────────────────────

#[test]
fn test_client_requires_key() {
    assert!(matches!(
        TogetherClient::new("  "),
        Err(TogetherError::AuthRequired)
    ));
}

#[test]
fn test_client_base_url_trims_slash() {
    let client = TogetherClient::new("k")
        .unwrap()
        .with_base_url("http://localhost:8080/v1/");
    assert_eq!(client.base_url(), "http://localhost:8080/v1");
}

#[test]
fn test_status_error_mapping() {
    let body = r#"{"error":{"message":"bad key"}}"#;
    assert!(matches!(
        status_error("files/upload", StatusCode::UNAUTHORIZED, body, None),
        TogetherError::Unauthorized { message } if message == "bad key"
    ));

    let limited = status_error(
        "fine-tunes",
        StatusCode::TOO_MANY_REQUESTS,
        "",
        Some(Duration::from_secs(7)),
    );
    assert!(limited.is_retryable());
    assert_eq!(limited.retry_after(), Some(Duration::from_secs(7)));

    let server = status_error("fine-tunes", StatusCode::BAD_GATEWAY, "oops", None);
    assert!(server.is_retryable());
    assert!(!server.is_user_error());

    let bad = status_error("fine-tunes", StatusCode::BAD_REQUEST, r#"{"message":"n_epochs"}"#, None);
    assert!(!bad.is_retryable());
    assert!(bad.is_user_error());
    assert!(bad.to_string().contains("n_epochs"));
}

#[test]
fn test_error_message_fallbacks() {
    assert_eq!(error_message(""), "empty response body");
    assert_eq!(error_message("  gateway down \n"), "gateway down");
}

#[test]
fn test_parse_retry_after() {
    assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
    assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
}

#[test]
fn test_retry_policy_backoff() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay(0, None), Duration::from_secs(1));
    assert_eq!(policy.delay(2, None), Duration::from_secs(4));
    assert_eq!(
        policy.delay(0, Some(Duration::from_secs(600))),
        Duration::from_secs(60)
    );
    assert_eq!(RetryPolicy::none().max_attempts, 1);
}

// ─── Retry loop ──────────────────────────────────────────────────────

/// Localhost server answering one scripted response per connection
struct TestServer {
    base_url: String,
    requests: Arc<AtomicUsize>,
}

impl TestServer {
    fn start(responses: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        std::thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                read_request(&mut stream);
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            requests,
        }
    }

    fn client(&self) -> TogetherClient {
        TogetherClient::new("test-key")
            .unwrap()
            .with_base_url(self.base_url.clone())
            .with_retry(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            })
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Consume headers and a `Content-Length` body
fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{extra_headers}\r\n{body}",
        body.len()
    )
}

const JOB_BODY: &str = r#"{"id":"ft-1","status":"running"}"#;

fn ok_job() -> String {
    http_response("200 OK", "", JOB_BODY)
}

#[test]
fn test_retry_honors_retry_after() {
    let server = TestServer::start(vec![
        http_response("429 Too Many Requests", "Retry-After: 1\r\n", ""),
        ok_job(),
    ]);

    let started = std::time::Instant::now();
    let job = server.client().fine_tune("ft-1").unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(server.requests(), 2);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[test]
fn test_retry_gives_up_after_max_attempts() {
    let unavailable = http_response("503 Service Unavailable", "", r#"{"message":"busy"}"#);
    let server = TestServer::start(vec![unavailable; 3]);

    let err = server.client().fine_tune("ft-1").unwrap_err();
    assert!(matches!(err, TogetherError::Api { status: 503, .. }));
    assert_eq!(server.requests(), 3);
}

#[test]
fn test_client_error_not_retried() {
    let server = TestServer::start(vec![
        http_response("400 Bad Request", "", r#"{"message":"n_epochs"}"#),
        ok_job(),
    ]);

    let err = server.client().fine_tune("ft-1").unwrap_err();
    assert!(matches!(err, TogetherError::Api { status: 400, .. }));
    assert_eq!(server.requests(), 1);
}

#[test]
fn test_create_not_resent_after_server_error() {
    let dir = TempDir::new().unwrap();
    let request = fast_apply_config(dir.path(), true).request(&uploaded(true));
    let server = TestServer::start(vec![
        http_response("502 Bad Gateway", "", "upstream"),
        ok_job(),
    ]);

    let err = server.client().create_fine_tune(&request).unwrap_err();
    assert!(matches!(err, TogetherError::Api { status: 502, .. }));
    assert_eq!(server.requests(), 1);
}

#[test]
fn test_create_resent_after_rate_limit() {
    let dir = TempDir::new().unwrap();
    let request = fast_apply_config(dir.path(), true).request(&uploaded(true));
    let server = TestServer::start(vec![
        http_response("429 Too Many Requests", "Retry-After: 0\r\n", ""),
        ok_job(),
    ]);

    let job = server.client().create_fine_tune(&request).unwrap();
    assert_eq!(job.id, "ft-1");
    assert_eq!(server.requests(), 2);
}

#[test]
fn test_connect_failure_is_unprocessed() {
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = TogetherClient::new("test-key")
        .unwrap()
        .with_base_url(format!("http://{addr}/v1"))
        .with_retry(RetryPolicy::none());

    let err = client.fine_tune("ft-1").unwrap_err();
    assert!(matches!(err, TogetherError::Connect { .. }));
    assert!(err.is_unprocessed());
    assert!(err.is_retryable());
}

// ─── Response parsing ────────────────────────────────────────────────

#[test]
fn test_job_status_parsing() {
    let job: FineTuneJob =
        serde_json::from_str(r#"{"id":"ft-1","status":"running","model":"m"}"#).unwrap();
    assert_eq!(job.status, JobStatus::Running);
    assert!(!job.status.is_terminal());

    let job: FineTuneJob =
        serde_json::from_str(r#"{"id":"ft-1","status":"brand_new_state"}"#).unwrap();
    assert_eq!(job.status, JobStatus::Unknown);

    let job: FineTuneJob = serde_json::from_str(r#"{"id":"ft-1"}"#).unwrap();
    assert_eq!(job.status, JobStatus::Pending);
}

#[test]
fn test_terminal_statuses() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Completed.is_success());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(JobStatus::Error.is_terminal());
    assert!(!JobStatus::CancelRequested.is_terminal());
    assert_eq!(JobStatus::CancelRequested.to_string(), "cancel_requested");
}

#[test]
fn test_file_object_parsing() {
    let file: FileObject = serde_json::from_str(
        r#"{"id":"file-abc","object":"file","filename":"train.jsonl","bytes":1024,"purpose":"fine-tune"}"#,
    )
    .unwrap();
    assert_eq!(file.id, "file-abc");
    assert_eq!(file.bytes, Some(1024));
}

#[test]
fn test_upload_cache_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let cache = UploadCache::load(dir.path()).unwrap();
    assert!(cache.is_empty());
}
