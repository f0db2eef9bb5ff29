//! Upload orchestration.
//!
//! One state machine per upload target (document, syllabus):
//! `Idle -> Validating -> Transferring -> {Indexed | Failed}`. Observers
//! subscribe to a watch channel carrying the current [`UploadState`];
//! terminal transitions and session-context updates happen here, transfer
//! progress comes from the gateway's reporter.

use std::sync::Arc;

use tokio::sync::watch;

use studium_core::backend::{DocumentReceipt, IngestOverview, IngestPhase, IngestStatus};
use studium_core::error::{Result, StudiumError};
use studium_core::session::{SessionStore, SyllabusData};
use studium_core::upload::{ProgressReporter, UploadFile, UploadState};
use studium_core::validate;
use studium_gateway::RequestGateway;

/// Observable state of one upload target.
struct UploadSlot {
    state: Arc<watch::Sender<UploadState>>,
    // Keep a receiver alive so the channel never reports zero receivers;
    // `watch::Sender::send` drops the value (returns Err) when none exist.
    _keep: watch::Receiver<UploadState>,
}

impl UploadSlot {
    fn new() -> Self {
        let (state, keep) = watch::channel(UploadState::Idle);
        Self {
            state: Arc::new(state),
            _keep: keep,
        }
    }

    fn set(&self, state: UploadState) {
        let _ = self.state.send(state);
    }

    fn current(&self) -> UploadState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    /// Reporter that maps transfer percentages onto `Transferring` states.
    fn reporter(&self) -> ProgressReporter {
        let state = Arc::clone(&self.state);
        ProgressReporter::new(move |progress| {
            let _ = state.send(UploadState::Transferring { progress });
        })
    }
}

/// Drives document and syllabus ingestion.
pub struct UploadOrchestrator {
    gateway: Arc<RequestGateway>,
    store: Arc<SessionStore>,
    document: UploadSlot,
    syllabus: UploadSlot,
}

impl UploadOrchestrator {
    pub fn new(gateway: Arc<RequestGateway>, store: Arc<SessionStore>) -> Self {
        Self {
            gateway,
            store,
            document: UploadSlot::new(),
            syllabus: UploadSlot::new(),
        }
    }

    /// Observable state of the document upload target.
    pub fn document_state(&self) -> watch::Receiver<UploadState> {
        self.document.subscribe()
    }

    /// Observable state of the syllabus upload target.
    pub fn syllabus_state(&self) -> watch::Receiver<UploadState> {
        self.syllabus.subscribe()
    }

    /// Uploads a study document and marks the session indexed on success.
    ///
    /// Validation runs synchronously on entry; an invalid file transitions
    /// straight to `Failed` without a network call. A success clears any
    /// prior failure reason.
    pub async fn ingest_document(&self, file: UploadFile) -> Result<DocumentReceipt> {
        if self.document.current().is_transferring() {
            return Err(StudiumError::duplicate_in_flight("ingest-document"));
        }

        self.document.set(UploadState::Validating);
        if let Err(err) = validate::validate_upload(&file, self.gateway.limits()) {
            self.document.set(UploadState::Failed {
                reason: err.user_message(),
            });
            return Err(err);
        }

        self.document.set(UploadState::Transferring { progress: 0 });
        let reporter = self.document.reporter();
        match self.gateway.submit_document(&file, &reporter).await {
            Ok(receipt) => {
                self.store.set_indexed(true).await;
                self.document.set(UploadState::Indexed);
                tracing::info!(
                    filename = %receipt.filename,
                    pages = receipt.page_count,
                    chunks = receipt.chunk_count,
                    "document indexed"
                );
                Ok(receipt)
            }
            Err(err) => {
                self.document.set(UploadState::Failed {
                    reason: err.user_message(),
                });
                tracing::warn!(filename = %file.name, error = %err, "document upload failed");
                Err(err)
            }
        }
    }

    /// Uploads a syllabus; the parsed result replaces the session's
    /// syllabus fields as one atomic group.
    pub async fn ingest_syllabus(&self, file: UploadFile) -> Result<SyllabusData> {
        if self.syllabus.current().is_transferring() {
            return Err(StudiumError::duplicate_in_flight("ingest-syllabus"));
        }

        self.syllabus.set(UploadState::Validating);
        if let Err(err) = validate::validate_upload(&file, self.gateway.limits()) {
            self.syllabus.set(UploadState::Failed {
                reason: err.user_message(),
            });
            return Err(err);
        }

        self.syllabus.set(UploadState::Transferring { progress: 0 });
        match self.gateway.submit_syllabus(&file).await {
            Ok(syllabus) => {
                self.store.apply_syllabus(syllabus.clone()).await;
                self.syllabus.set(UploadState::Indexed);
                tracing::info!(subject = %syllabus.subject, units = syllabus.units.len(), "syllabus parsed");
                Ok(syllabus)
            }
            Err(err) => {
                self.syllabus.set(UploadState::Failed {
                    reason: err.user_message(),
                });
                tracing::warn!(filename = %file.name, error = %err, "syllabus upload failed");
                Err(err)
            }
        }
    }

    /// Ingestion status of one file.
    pub async fn ingest_status(&self, filename: &str) -> Result<IngestStatus> {
        self.gateway.ingest_status(filename).await
    }

    /// Status of every file the backend knows about.
    pub async fn ingest_overview(&self) -> Result<IngestOverview> {
        self.gateway.ingest_overview().await
    }

    /// Re-derives the session's indexed flag from the backend status.
    pub async fn refresh_indexed(&self) -> Result<bool> {
        let overview = self.gateway.ingest_overview().await?;
        let indexed = overview
            .values()
            .any(|status| status.status == IngestPhase::Completed);
        self.store.set_indexed(indexed).await;
        Ok(indexed)
    }

    /// Deletes one document on the backend. The indexed flag is refreshed by
    /// the next status poll, not guessed here.
    pub async fn delete_document(&self, filename: &str) -> Result<()> {
        self.gateway.delete_document(filename).await
    }

    /// Backend-wide reset mirrored into the session: all documents dropped,
    /// session context back to its initial state, both targets idle.
    pub async fn reset(&self) -> Result<()> {
        self.gateway.reset_all().await?;
        self.store.reset_all().await;
        self.document.set(UploadState::Idle);
        self.syllabus.set(UploadState::Idle);
        Ok(())
    }
}
