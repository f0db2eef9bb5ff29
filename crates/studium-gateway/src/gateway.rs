//! The request gateway.
//!
//! Sole boundary between orchestration and the network. All validation
//! short-circuits, duplicate detection and history-window trimming happen
//! here; the transport behind the [`BackendClient`] seam only moves bytes.

use std::sync::Arc;

use studium_core::backend::{
    AskReply, AskRequest, BackendClient, DocumentReceipt, IngestOverview, IngestStatus,
};
use studium_core::config::{ClientConfig, Limits, MarksProfile};
use studium_core::error::Result;
use studium_core::session::{Message, SyllabusData, history_window};
use studium_core::upload::{ProgressReporter, UploadFile};
use studium_core::validate;

use crate::fingerprint::{Fingerprint, RequestRegistry};

/// Fingerprint key for the document upload target.
const FP_INGEST_DOCUMENT: &str = "ingest-document";
/// Fingerprint key for the syllabus upload target.
const FP_INGEST_SYLLABUS: &str = "ingest-syllabus";

/// Study context accompanying a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionContext {
    /// Standard mode: optional free-text syllabus context.
    Standard { syllabus_context: Option<String> },
    /// Contextual study mode: explicit subject/unit/topic selection.
    Contextual {
        subject: String,
        unit: String,
        topic: String,
    },
}

/// Validates and issues outbound backend calls.
///
/// Owns the fingerprint registry (at most one in-flight request per
/// fingerprint; the second attempt is rejected, never queued) and the
/// history-window policy. One instance serves the whole session.
pub struct RequestGateway {
    transport: Arc<dyn BackendClient>,
    registry: Arc<RequestRegistry>,
    limits: Limits,
    marks_profile: MarksProfile,
}

impl RequestGateway {
    /// Creates a gateway over `transport` with the configured validation
    /// ceilings and marks profile.
    pub fn new(transport: Arc<dyn BackendClient>, config: &ClientConfig) -> Self {
        Self {
            transport,
            registry: Arc::new(RequestRegistry::new()),
            limits: config.limits.clone(),
            marks_profile: config.marks_profile,
        }
    }

    /// The validation ceilings this gateway enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Uploads a document for ingestion.
    ///
    /// Rejects invalid files before any network call. `progress` receives
    /// monotonically increasing values in `[0, 99]` during transfer; 100 is
    /// never asserted client-side. One document transfer at a time.
    pub async fn submit_document(
        &self,
        file: &UploadFile,
        progress: &ProgressReporter,
    ) -> Result<DocumentReceipt> {
        validate::validate_upload(file, &self.limits)?;
        let _guard = self
            .registry
            .acquire(Fingerprint::for_operation(FP_INGEST_DOCUMENT))?;
        self.transport.ingest_document(file, progress).await
    }

    /// Uploads a syllabus and returns the parsed structure. Single-shot,
    /// no progress reporting.
    pub async fn submit_syllabus(&self, file: &UploadFile) -> Result<SyllabusData> {
        validate::validate_upload(file, &self.limits)?;
        let _guard = self
            .registry
            .acquire(Fingerprint::for_operation(FP_INGEST_SYLLABUS))?;
        self.transport.upload_syllabus(file).await
    }

    /// Sends a question with its study context and conversational history.
    ///
    /// `messages` is the full session log; the trimmed last-N window is
    /// built here and omitted from the payload entirely when empty. A
    /// question whose fingerprint matches one already in flight fails
    /// immediately with `DuplicateInFlight` without reaching the network.
    pub async fn submit_question(
        &self,
        question: &str,
        context: QuestionContext,
        marks: u32,
        messages: &[Message],
    ) -> Result<AskReply> {
        validate::validate_question(question, &self.limits)?;
        validate::validate_marks(marks, self.marks_profile)?;

        let fingerprint = Fingerprint::for_question(question, self.limits.fingerprint_prefix);
        let _guard = self.registry.acquire(fingerprint)?;

        let window = history_window(messages, self.limits.history_window);
        let (syllabus_context, subject, unit, topic) = match context {
            QuestionContext::Standard { syllabus_context } => (
                syllabus_context.filter(|text| !text.trim().is_empty()),
                None,
                None,
                None,
            ),
            QuestionContext::Contextual {
                subject,
                unit,
                topic,
            } => (None, Some(subject), Some(unit), Some(topic)),
        };

        let request = AskRequest {
            question: question.trim().to_string(),
            syllabus_context,
            subject,
            unit,
            topic,
            marks,
            chat_history: (!window.is_empty()).then_some(window),
        };

        tracing::debug!(marks, "dispatching question");
        self.transport.ask(&request).await
    }

    /// Ingestion status for one file.
    pub async fn ingest_status(&self, filename: &str) -> Result<IngestStatus> {
        validate::validate_filename(filename)?;
        self.transport.ingest_status(filename).await
    }

    /// Ingestion status for every known file.
    pub async fn ingest_overview(&self) -> Result<IngestOverview> {
        self.transport.ingest_overview().await
    }

    /// Deletes one ingested document.
    pub async fn delete_document(&self, filename: &str) -> Result<()> {
        validate::validate_filename(filename)?;
        self.transport.delete_document(filename).await
    }

    /// Drops all ingested documents on the backend.
    pub async fn reset_all(&self) -> Result<()> {
        self.transport.reset_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::watch;

    /// Transport double: records requests, counts calls, and can hold `ask`
    /// open until released to simulate an in-flight request.
    struct MockBackend {
        calls: AtomicUsize,
        asks: Mutex<Vec<AskRequest>>,
        gate: Option<watch::Receiver<bool>>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                asks: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn gated() -> (Self, watch::Sender<bool>) {
            let (tx, rx) = watch::channel(false);
            let mut backend = Self::new();
            backend.gate = Some(rx);
            (backend, tx)
        }

        async fn wait_for_gate(&self) {
            if let Some(gate) = &self.gate {
                let mut gate = gate.clone();
                while !*gate.borrow_and_update() {
                    gate.changed().await.expect("gate sender dropped");
                }
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BackendClient for MockBackend {
        async fn ingest_document(
            &self,
            file: &UploadFile,
            progress: &ProgressReporter,
        ) -> Result<DocumentReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            progress.report(100);
            Ok(DocumentReceipt {
                filename: file.name.clone(),
                page_count: 10,
                chunk_count: 40,
            })
        }

        async fn ingest_status(&self, _filename: &str) -> Result<IngestStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(IngestStatus {
                status: studium_core::backend::IngestPhase::Completed,
                pages: 10,
                chunks: 40,
                error: None,
            })
        }

        async fn ingest_overview(&self) -> Result<IngestOverview> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(IngestOverview::new())
        }

        async fn upload_syllabus(&self, _file: &UploadFile) -> Result<SyllabusData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SyllabusData {
                subject: "History".to_string(),
                units: Vec::new(),
            })
        }

        async fn ask(&self, request: &AskRequest) -> Result<AskReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.asks.lock().unwrap().push(request.clone());
            self.wait_for_gate().await;
            Ok(AskReply {
                answer: "An answer.".to_string(),
                sources: Vec::new(),
                error: false,
            })
        }

        async fn delete_document(&self, _filename: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn reset_all(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn gateway_over(backend: Arc<MockBackend>) -> RequestGateway {
        RequestGateway::new(backend, &ClientConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_file_never_reaches_network() {
        let backend = Arc::new(MockBackend::new());
        let gateway = gateway_over(backend.clone());

        let empty = UploadFile::from_bytes("notes.pdf", Vec::new());
        assert!(
            gateway
                .submit_document(&empty, &ProgressReporter::noop())
                .await
                .is_err()
        );

        let wrong_type = UploadFile::from_bytes("notes.txt", vec![1]);
        assert!(gateway.submit_syllabus(&wrong_type).await.is_err());

        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_question_never_reaches_network() {
        let backend = Arc::new(MockBackend::new());
        let gateway = gateway_over(backend.clone());

        let context = QuestionContext::Standard {
            syllabus_context: None,
        };
        assert!(
            gateway
                .submit_question("   ", context.clone(), 3, &[])
                .await
                .is_err()
        );
        let long = "q".repeat(1001);
        assert!(
            gateway
                .submit_question(&long, context.clone(), 3, &[])
                .await
                .is_err()
        );
        // marks outside the preset profile
        assert!(
            gateway
                .submit_question("valid question", context, 4, &[])
                .await
                .is_err()
        );

        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_question_rejected_while_first_pending() {
        let (backend, gate) = MockBackend::gated();
        let backend = Arc::new(backend);
        let gateway = Arc::new(gateway_over(backend.clone()));

        let first = {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                gateway
                    .submit_question(
                        "What is the role of mitochondria in cells?",
                        QuestionContext::Standard {
                            syllabus_context: None,
                        },
                        3,
                        &[],
                    )
                    .await
            })
        };

        // wait until the first call is inside the transport
        while backend.call_count() == 0 {
            tokio::task::yield_now().await;
        }

        // identical 20-char prefix, different tail
        let err = gateway
            .submit_question(
                "What is the role of mitochondria in plants?",
                QuestionContext::Standard {
                    syllabus_context: None,
                },
                3,
                &[],
            )
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(backend.call_count(), 1);

        gate.send(true).unwrap();
        first.await.unwrap().unwrap();

        // after the first resolves, a repeat submission goes through
        gateway
            .submit_question(
                "What is the role of mitochondria in cells?",
                QuestionContext::Standard {
                    syllabus_context: None,
                },
                3,
                &[],
            )
            .await
            .unwrap();
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_history_window_trimmed_and_omitted_when_empty() {
        let backend = Arc::new(MockBackend::new());
        let gateway = gateway_over(backend.clone());
        let context = QuestionContext::Standard {
            syllabus_context: None,
        };

        gateway
            .submit_question("no history yet", context.clone(), 3, &[])
            .await
            .unwrap();

        let log: Vec<Message> = (0..30)
            .map(|i| Message::user(format!("question {i}")))
            .collect();
        gateway
            .submit_question("with history", context, 3, &log)
            .await
            .unwrap();

        let asks = backend.asks.lock().unwrap();
        assert!(asks[0].chat_history.is_none());
        let window = asks[1].chat_history.as_ref().unwrap();
        assert_eq!(window.len(), 10);
        assert_eq!(window[9].content, "question 29");
    }

    #[tokio::test]
    async fn test_contextual_payload_shape() {
        let backend = Arc::new(MockBackend::new());
        let gateway = gateway_over(backend.clone());

        gateway
            .submit_question(
                "  Explain deadlocks.  ",
                QuestionContext::Contextual {
                    subject: "Operating Systems".to_string(),
                    unit: "Unit II".to_string(),
                    topic: "Concurrency".to_string(),
                },
                12,
                &[],
            )
            .await
            .unwrap();

        let asks = backend.asks.lock().unwrap();
        assert_eq!(asks[0].question, "Explain deadlocks.");
        assert_eq!(asks[0].subject.as_deref(), Some("Operating Systems"));
        assert_eq!(asks[0].unit.as_deref(), Some("Unit II"));
        assert_eq!(asks[0].topic.as_deref(), Some("Concurrency"));
        assert!(asks[0].syllabus_context.is_none());
    }

    #[tokio::test]
    async fn test_blank_standard_context_omitted() {
        let backend = Arc::new(MockBackend::new());
        let gateway = gateway_over(backend.clone());

        gateway
            .submit_question(
                "plain question",
                QuestionContext::Standard {
                    syllabus_context: Some("   ".to_string()),
                },
                5,
                &[],
            )
            .await
            .unwrap();

        let asks = backend.asks.lock().unwrap();
        assert!(asks[0].syllabus_context.is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_filename() {
        let backend = Arc::new(MockBackend::new());
        let gateway = gateway_over(backend.clone());

        assert!(gateway.delete_document("  ").await.is_err());
        assert_eq!(backend.call_count(), 0);

        gateway.delete_document("notes.pdf").await.unwrap();
        assert_eq!(backend.call_count(), 1);
    }
}
