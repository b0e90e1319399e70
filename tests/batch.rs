//! Batch pipeline integration tests against a scripted vision backend.
//!
//! The backend answers based on a marker in the document bytes, so each
//! test controls per-document behaviour without a network.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use visionparse::pipeline::encode::{GenerateContentRequest, Part};
use visionparse::pipeline::extract::BackendResponse;
use visionparse::{
    generate, process_batch, process_batch_detailed, process_stream, run_batch, Batch,
    BatchOptions, BatchProgressCallback, BatchStatus, Document, DocumentError, ExtractionClient,
    ExtractionConfig, ReportFormat, VisionBackend,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Responds according to the document's bytes:
/// - `json:<text>`   → 200 with `<text>` fenced as ```json
/// - `raw:<text>`    → 200 with `<text>` unfenced
/// - `status:<code>` → that status
/// - `sleep:<ms>:<text>` → delay, then like `json:`
struct MarkerBackend {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MarkerBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

fn candidate(text: &str) -> BackendResponse {
    BackendResponse {
        status: 200,
        body: json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string(),
    }
}

#[async_trait]
impl VisionBackend for MarkerBackend {
    async fn send(&self, request: &GenerateContentRequest) -> Result<BackendResponse, DocumentError> {
        use base64::Engine as _;

        self.calls.fetch_add(1, Ordering::SeqCst);
        let parts = &request.contents[0].parts;
        let (data, prompt) = match (&parts[0], &parts[1]) {
            (Part::InlineData { inline_data }, Part::Text { text }) => (&inline_data.data, text),
            other => panic!("unexpected parts: {other:?}"),
        };
        self.prompts.lock().unwrap().push(prompt.clone());

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .expect("valid base64");
        let marker = String::from_utf8(bytes).expect("utf-8 marker");

        if let Some(rest) = marker.strip_prefix("sleep:") {
            let (ms, text) = rest.split_once(':').expect("sleep:<ms>:<text>");
            tokio::time::sleep(Duration::from_millis(ms.parse().unwrap())).await;
            return Ok(candidate(&format!("```json\n{text}\n```")));
        }
        if let Some(text) = marker.strip_prefix("json:") {
            return Ok(candidate(&format!("```json\n{text}\n```")));
        }
        if let Some(text) = marker.strip_prefix("raw:") {
            return Ok(candidate(text));
        }
        if let Some(code) = marker.strip_prefix("status:") {
            return Ok(BackendResponse {
                status: code.parse().unwrap(),
                body: "upstream error".into(),
            });
        }
        Err(DocumentError::Transport {
            detail: format!("unknown marker {marker}"),
        })
    }
}

fn config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .api_key("test-key")
        .concurrency(4)
        .max_retries(0)
        .build()
        .unwrap()
}

fn client(backend: Arc<MarkerBackend>) -> ExtractionClient {
    ExtractionClient::with_backend(config(), backend)
}

fn doc(name: &str, marker: &str) -> Document {
    Document::from_bytes(name, marker.as_bytes().to_vec())
}

fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn one_result_per_document_in_order() {
    init_tracing();
    let backend = MarkerBackend::new();
    let docs = vec![
        doc("a.pdf", r#"sleep:60:{"n": 1}"#),
        doc("b.png", r#"sleep:5:{"n": 2}"#),
        doc("c.jpg", r#"json:{"n": 3}"#),
    ];

    let results = process_batch(&client(backend.clone()), &docs, &fields(&["n"]), true).await;

    assert_eq!(results.len(), docs.len());
    let ns: Vec<&Value> = results.iter().map(|r| &r["n"]).collect();
    assert_eq!(ns, vec![&json!(1), &json!(2), &json!(3)]);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failures_degrade_only_their_own_row() {
    let backend = MarkerBackend::new();
    let docs = vec![
        doc("ok.pdf", r#"json:{"total": 100}"#),
        doc("bad_status.pdf", "status:500"),
        doc("notes.txt", "json:{}"),
        doc("prose.png", "raw:Sorry, I cannot read this invoice."),
        doc("array.png", "raw:[1, 2, 3]"),
        doc("ok2.pdf", r#"raw:{"total": 7}"#),
    ];

    let output =
        process_batch_detailed(&client(backend.clone()), &docs, &fields(&["total"]), false).await;

    assert_eq!(output.documents.len(), 6);
    assert_eq!(output.documents[0].fields["total"], json!(100));
    assert!(matches!(
        output.documents[1].error,
        Some(DocumentError::HttpStatus { status: 500, .. })
    ));
    assert!(matches!(
        output.documents[2].error,
        Some(DocumentError::UnsupportedFileType { .. })
    ));
    assert!(matches!(output.documents[3].error, Some(DocumentError::InvalidJson { .. })));
    assert!(matches!(output.documents[4].error, Some(DocumentError::InvalidJson { .. })));
    assert_eq!(output.documents[5].fields["total"], json!(7));

    for failed in &output.documents[1..5] {
        assert!(failed.fields.is_empty());
    }
    for (i, d) in output.documents.iter().enumerate() {
        assert_eq!(d.index, i);
        assert_eq!(d.filename, docs[i].filename());
    }

    assert_eq!(output.stats.total_documents, 6);
    assert_eq!(output.stats.succeeded, 2);
    assert_eq!(output.stats.failed, 4);
    // the .txt document never reached the backend
    assert_eq!(backend.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn empty_model_answer_is_success_with_no_fields() {
    let backend = MarkerBackend::new();
    let docs = vec![doc("blank.pdf", "json:{}")];
    let output = process_batch_detailed(&client(backend), &docs, &[], false).await;
    assert!(output.documents[0].is_success());
    assert!(output.documents[0].fields.is_empty());
    assert_eq!(output.stats.empty, 1);
}

#[tokio::test]
async fn prompt_built_once_and_shared() {
    let backend = MarkerBackend::new();
    let docs = vec![doc("a.pdf", "json:{}"), doc("b.pdf", "json:{}"), doc("c.pdf", "json:{}")];
    process_batch(&client(backend.clone()), &docs, &fields(&["total", "date"]), true).await;

    let prompts = backend.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().all(|p| p == &prompts[0]));
    assert!(prompts[0].contains("only"));
    assert!(prompts[0].contains("total, date"));
}

#[tokio::test]
async fn empty_batch() {
    let backend = MarkerBackend::new();
    let results = process_batch(&client(backend.clone()), &[], &fields(&["total"]), true).await;
    assert!(results.is_empty());
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

// ── End-to-end batch runs ────────────────────────────────────────────────────

#[tokio::test]
async fn run_batch_completes_with_csv() {
    let backend = MarkerBackend::new();
    let docs = vec![
        doc("a.pdf", r#"json:{"invoice_number": "INV-1", "total": 100}"#),
        doc("b.pdf", "status:503"),
        doc("c.pdf", r#"json:{"total": 5, "invoice_number": "INV-3", "lines": {"a": 1}}"#),
    ];
    let options = BatchOptions::new(fields(&["invoice_number", "total"]), true, ReportFormat::Csv);
    let mut batch = Batch::with_id("b7", docs, options);

    let report = run_batch(&client(backend), &mut batch).await.unwrap();

    assert_eq!(batch.status, BatchStatus::Completed);
    assert_eq!(report.artifact.filename, "result_b7.csv");
    assert_eq!(report.artifact.content_type, "text/csv");

    let rows: Vec<Vec<String>> = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(report.artifact.bytes.as_slice())
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["invoice_number", "total"],
            vec!["INV-1", "100"],
            vec!["", ""],
            vec!["INV-3", "5"],
        ]
    );
}

#[tokio::test]
async fn run_batch_json_round_trip() {
    let backend = MarkerBackend::new();
    let docs = vec![doc("a.pdf", r#"json:{"invoice_number": "INV-1", "total": 100}"#)];
    let options = BatchOptions::new(vec![], false, ReportFormat::Json);
    let mut batch = Batch::new(docs, options);

    let report = run_batch(&client(backend), &mut batch).await.unwrap();
    let parsed: Value = serde_json::from_slice(&report.artifact.bytes).unwrap();
    assert_eq!(parsed, json!([{"invoice_number": "INV-1", "total": 100}]));
    assert_eq!(report.artifact.filename, format!("result_{}.json", batch.id));
}

#[tokio::test]
async fn run_batch_rejects_rerun() {
    let backend = MarkerBackend::new();
    let mut batch = Batch::new(vec![], BatchOptions::default());
    run_batch(&client(backend.clone()), &mut batch).await.unwrap();
    assert!(run_batch(&client(backend), &mut batch).await.is_err());
    assert_eq!(batch.status, BatchStatus::Completed);
}

#[tokio::test]
async fn report_failure_marks_batch_failed() {
    // rust_xlsxwriter caps columns at 16 384; one result with more keys
    // cannot be written.
    let wide: serde_json::Map<String, Value> =
        (0..20_000).map(|i| (format!("f{i}"), json!(i))).collect();
    let marker = format!("raw:{}", Value::Object(wide));

    let backend = MarkerBackend::new();
    let options = BatchOptions::new(vec![], false, ReportFormat::Xlsx);
    let mut batch = Batch::new(vec![doc("wide.pdf", &marker)], options);

    let err = run_batch(&client(backend), &mut batch).await.unwrap_err();
    assert!(matches!(err, visionparse::VisionParseError::ReportFailed { .. }));
    assert_eq!(batch.status, BatchStatus::Failed);
}

#[test]
fn run_batch_sync_outside_runtime() {
    let backend = MarkerBackend::new();
    let options = BatchOptions::new(vec![], false, ReportFormat::Xml);
    let mut batch = Batch::with_id("sync", vec![doc("a.pdf", r#"json:{"k": "v"}"#)], options);

    let report = visionparse::run_batch_sync(&client(backend), &mut batch).unwrap();
    let xml = String::from_utf8(report.artifact.bytes).unwrap();
    assert!(xml.contains(r#"<field name="k">v</field>"#));
    assert_eq!(batch.status, BatchStatus::Completed);
}

// ── Reports over extracted results ───────────────────────────────────────────

#[tokio::test]
async fn every_format_handles_heterogeneous_results() {
    let backend = MarkerBackend::new();
    let docs = vec![
        doc("a.pdf", r#"json:{"vendor": "ACME", "total": 12.5}"#),
        doc("b.pdf", r#"json:{"items": [{"sku": "X1"}], "vendor": "Globex"}"#),
        doc("c.pdf", "status:400"),
    ];
    let results = process_batch(&client(backend), &docs, &[], false).await;

    for format in ReportFormat::ALL {
        let artifact = generate(&results, format, "mixed").unwrap();
        assert!(!artifact.bytes.is_empty(), "{format} produced no bytes");
        assert_eq!(artifact.filename, format!("result_mixed.{format}"));
    }
}

// ── Progress + streaming ─────────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    started: AtomicUsize,
    completed: AtomicUsize,
    errored: AtomicUsize,
    batch_total: AtomicUsize,
    batch_success: AtomicUsize,
}

impl BatchProgressCallback for Counting {
    fn on_batch_start(&self, total: usize) {
        self.batch_total.store(total, Ordering::SeqCst);
    }
    fn on_document_start(&self, _index: usize, _total: usize, _filename: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_complete(&self, _index: usize, _total: usize, _fields: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_error(&self, _index: usize, _total: usize, _error: &str) {
        self.errored.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total: usize, success: usize) {
        self.batch_success.store(success, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn progress_callback_sees_every_document() {
    let counting = Arc::new(Counting::default());
    let config = ExtractionConfig::builder()
        .api_key("k")
        .max_retries(0)
        .progress_callback(counting.clone())
        .build()
        .unwrap();
    let client = ExtractionClient::with_backend(config, MarkerBackend::new());
    let docs = vec![doc("a.pdf", "json:{}"), doc("b.pdf", "status:401"), doc("c.pdf", "json:{}")];

    process_batch(&client, &docs, &[], false).await;

    assert_eq!(counting.batch_total.load(Ordering::SeqCst), 3);
    assert_eq!(counting.started.load(Ordering::SeqCst), 3);
    assert_eq!(counting.completed.load(Ordering::SeqCst), 2);
    assert_eq!(counting.errored.load(Ordering::SeqCst), 1);
    assert_eq!(counting.batch_success.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn stream_yields_every_document_once() {
    let backend = MarkerBackend::new();
    let docs = vec![
        doc("slow.pdf", r#"sleep:50:{"n": 0}"#),
        doc("fast.pdf", r#"json:{"n": 1}"#),
        doc("bad.pdf", "status:500"),
    ];

    let mut items: Vec<_> = process_stream(client(backend), docs, &[], false)
        .collect()
        .await;
    assert_eq!(items.len(), 3);

    items.sort_by_key(|d| d.index);
    assert_eq!(items[0].fields["n"], json!(0));
    assert_eq!(items[1].fields["n"], json!(1));
    assert!(items[2].error.is_some());
}
