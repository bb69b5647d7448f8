//! Extraction Orchestrator — drives one document through
//! load → invoke → parse → validate → store, and fans that out over a batch.
//!
//! Every stage failure short-circuits the document to `Rejected`; later
//! stages never run. Document failures never abort the batch, but a fatal
//! model error (auth/quota) marks every remaining document `Skipped`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::errors::PipelineError;
use crate::extraction::{parser, validator};
use crate::extraction::validator::ValidationResult;
use crate::llm_client::ModelInvoker;
use crate::loader;
use crate::models::record::ResumeRecord;
use crate::sink::{RecordSink, SinkReceipt};

/// What happened on the sink for an accepted record. A sink failure is
/// reported here but never demotes the record to `Rejected`.
#[derive(Debug)]
pub enum SinkStatus {
    Stored(SinkReceipt),
    Failed(String),
}

/// Terminal state of one document's pipeline run.
#[derive(Debug)]
pub enum DocumentOutcome {
    Accepted {
        record: ResumeRecord,
        sink: SinkStatus,
    },
    Rejected {
        error: PipelineError,
    },
    Skipped,
}

#[derive(Debug)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
}

/// Full account of a batch run: one result per input path, in input order,
/// plus aggregate counts. `fatal` is set when the batch aborted early.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<DocumentResult>,
    pub summary: BatchSummary,
    pub fatal: Option<String>,
}

impl BatchReport {
    pub fn aborted(&self) -> bool {
        self.fatal.is_some()
    }
}

pub struct Pipeline {
    model: Arc<dyn ModelInvoker>,
    sink: Arc<dyn RecordSink>,
}

impl Pipeline {
    pub fn new(model: Arc<dyn ModelInvoker>, sink: Arc<dyn RecordSink>) -> Self {
        Self { model, sink }
    }

    /// Runs one document to a terminal state.
    pub async fn process(&self, path: &Path) -> DocumentOutcome {
        let document = match loader::load(path) {
            Ok(document) => document,
            Err(e) => return Self::reject(path, e.into()),
        };
        debug!(
            path = %document.path.display(),
            format = %document.format,
            chars = document.text.len(),
            "document loaded"
        );

        let raw = match self.model.extract(&document.text).await {
            Ok(raw) => raw,
            Err(e) => return Self::reject(path, e.into()),
        };

        let record = match parser::parse_model_output(&raw) {
            Ok(record) => record,
            Err(e) => return Self::reject(path, e.into()),
        };

        if let ValidationResult::Invalid(errors) = validator::validate(&record) {
            return Self::reject(path, PipelineError::Validation(errors));
        }

        let sink = match self.sink.store(&record).await {
            Ok(receipt) => SinkStatus::Stored(receipt),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "sink failed for accepted record");
                SinkStatus::Failed(e.to_string())
            }
        };

        info!(path = %path.display(), name = %record.name, "record accepted");
        DocumentOutcome::Accepted { record, sink }
    }

    /// Processes `paths` sequentially in input order. Aborts on the first
    /// fatal model error, marking all remaining paths `Skipped`.
    pub async fn run_batch(&self, paths: &[PathBuf]) -> BatchReport {
        let mut results = Vec::with_capacity(paths.len());
        let mut summary = BatchSummary::default();
        let mut fatal: Option<String> = None;

        let mut iter = paths.iter();
        for path in iter.by_ref() {
            info!(path = %path.display(), "processing document");
            let outcome = self.process(path).await;

            match &outcome {
                DocumentOutcome::Accepted { .. } => summary.accepted += 1,
                DocumentOutcome::Rejected { error } => {
                    summary.rejected += 1;
                    if error.is_fatal() {
                        error!(path = %path.display(), error = %error, "fatal model error, aborting batch");
                        fatal = Some(error.to_string());
                    }
                }
                DocumentOutcome::Skipped => summary.skipped += 1,
            }

            results.push(DocumentResult {
                path: path.clone(),
                outcome,
            });

            if fatal.is_some() {
                break;
            }
        }

        for path in iter {
            summary.skipped += 1;
            results.push(DocumentResult {
                path: path.clone(),
                outcome: DocumentOutcome::Skipped,
            });
        }

        BatchReport {
            results,
            summary,
            fatal,
        }
    }

    fn reject(path: &Path, error: PipelineError) -> DocumentOutcome {
        warn!(
            path = %path.display(),
            stage = error.stage(),
            error = %error,
            "document rejected"
        );
        DocumentOutcome::Rejected { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::errors::{DocumentError, ModelError, SinkError};
    use crate::loader::write_minimal_docx;

    /// Scripted model: pops one canned response per call.
    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<String, ModelError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String, ModelError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelInvoker for ScriptedModel {
        async fn extract(&self, _document_text: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyContent))
        }
    }

    struct CollectingSink {
        stored: Mutex<Vec<ResumeRecord>>,
        fail: bool,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                stored: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl RecordSink for CollectingSink {
        async fn store(&self, record: &ResumeRecord) -> Result<SinkReceipt, SinkError> {
            if self.fail {
                return Err(SinkError::Rejected("unknown field".to_string()));
            }
            self.stored.lock().unwrap().push(record.clone());
            Ok(SinkReceipt::Created("rec123".to_string()))
        }
    }

    fn docx_fixture(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        write_minimal_docx(&path, &["Jane Doe", "jane@x.com", "Skills: Python, SQL"]);
        path
    }

    const MODEL_JSON: &str = r#"{
        "name": "Jane Doe",
        "email": "jane@x.com",
        "phone": "",
        "skills": ["Python", "Python", "SQL"],
        "experience": [],
        "education": []
    }"#;

    fn pipeline(
        model: Arc<ScriptedModel>,
        sink: Arc<CollectingSink>,
    ) -> Pipeline {
        Pipeline::new(model, sink)
    }

    #[tokio::test]
    async fn test_accepted_document_with_deduplicated_skills() {
        let dir = tempfile::tempdir().unwrap();
        let path = docx_fixture(&dir, "resume1.docx");
        let model = Arc::new(ScriptedModel::new(vec![Ok(MODEL_JSON.to_string())]));
        let sink = Arc::new(CollectingSink::new());
        let pipeline = pipeline(model.clone(), sink.clone());

        match pipeline.process(&path).await {
            DocumentOutcome::Accepted { record, sink: status } => {
                assert_eq!(record.skills, vec!["Python", "SQL"]);
                assert!(matches!(status, SinkStatus::Stored(SinkReceipt::Created(_))));
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
        assert_eq!(sink.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_format_rejects_without_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "plain text").unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Ok(MODEL_JSON.to_string())]));
        let sink = Arc::new(CollectingSink::new());
        let pipeline = pipeline(model.clone(), sink);

        match pipeline.process(&path).await {
            DocumentOutcome::Rejected { error } => {
                assert_eq!(error.stage(), "load");
                assert!(matches!(
                    error,
                    PipelineError::Document(DocumentError::UnsupportedFormat(_))
                ));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_record_is_rejected_with_all_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = docx_fixture(&dir, "resume.docx");
        let bad = r#"{"name": "", "email": "not-an-email"}"#;
        let model = Arc::new(ScriptedModel::new(vec![Ok(bad.to_string())]));
        let sink = Arc::new(CollectingSink::new());
        let pipeline = pipeline(model, sink.clone());

        match pipeline.process(&path).await {
            DocumentOutcome::Rejected { error } => {
                assert_eq!(error.stage(), "validate");
                match error {
                    PipelineError::Validation(errors) => assert_eq!(errors.len(), 2),
                    other => panic!("expected Validation, got {other:?}"),
                }
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert!(sink.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_output_is_rejected_at_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = docx_fixture(&dir, "resume.docx");
        let model = Arc::new(ScriptedModel::new(vec![Ok("not json at all".to_string())]));
        let pipeline = pipeline(model, Arc::new(CollectingSink::new()));

        match pipeline.process(&path).await {
            DocumentOutcome::Rejected { error } => assert_eq!(error.stage(), "parse"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_record_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = docx_fixture(&dir, "resume.docx");
        let model = Arc::new(ScriptedModel::new(vec![Ok(MODEL_JSON.to_string())]));
        let pipeline = Pipeline::new(model, Arc::new(CollectingSink::failing()));

        match pipeline.process(&path).await {
            DocumentOutcome::Accepted { sink, .. } => {
                assert!(matches!(sink, SinkStatus::Failed(_)));
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_model_unavailable_rejects_document_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![docx_fixture(&dir, "a.docx"), docx_fixture(&dir, "b.docx")];
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::Unavailable {
                attempts: 3,
                last: "timeout".to_string(),
            }),
            Ok(MODEL_JSON.to_string()),
        ]));
        let pipeline = pipeline(model.clone(), Arc::new(CollectingSink::new()));

        let report = pipeline.run_batch(&paths).await;
        assert!(!report.aborted());
        assert_eq!(report.summary, BatchSummary {
            accepted: 1,
            rejected: 1,
            skipped: 0,
        });
        assert!(matches!(
            report.results[0].outcome,
            DocumentOutcome::Rejected { .. }
        ));
        assert!(matches!(
            report.results[1].outcome,
            DocumentOutcome::Accepted { .. }
        ));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_fatal_auth_error_skips_remaining_documents() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (1..=5)
            .map(|i| docx_fixture(&dir, &format!("resume{i}.docx")))
            .collect();
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(MODEL_JSON.to_string()),
            Err(ModelError::Auth("invalid x-api-key".to_string())),
        ]));
        let pipeline = pipeline(model.clone(), Arc::new(CollectingSink::new()));

        let report = pipeline.run_batch(&paths).await;
        assert!(report.aborted());
        assert_eq!(report.summary, BatchSummary {
            accepted: 1,
            rejected: 1,
            skipped: 3,
        });
        assert_eq!(report.results.len(), 5);
        assert!(matches!(
            report.results[0].outcome,
            DocumentOutcome::Accepted { .. }
        ));
        assert!(matches!(
            report.results[1].outcome,
            DocumentOutcome::Rejected { .. }
        ));
        for result in &report.results[2..] {
            assert!(matches!(result.outcome, DocumentOutcome::Skipped));
        }
        // No call was made for the skipped documents.
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_results_stay_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            docx_fixture(&dir, "a.docx"),
            dir.path().join("missing.docx"),
            docx_fixture(&dir, "c.docx"),
        ];
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(MODEL_JSON.to_string()),
            Ok(MODEL_JSON.to_string()),
        ]));
        let pipeline = pipeline(model, Arc::new(CollectingSink::new()));

        let report = pipeline.run_batch(&paths).await;
        assert_eq!(report.results.len(), 3);
        for (result, path) in report.results.iter().zip(&paths) {
            assert_eq!(&result.path, path);
        }
        assert!(matches!(
            report.results[1].outcome,
            DocumentOutcome::Rejected { .. }
        ));
    }
}
