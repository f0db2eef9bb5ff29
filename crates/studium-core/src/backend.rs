//! Backend REST contract.
//!
//! The backend (document parsing, indexing, answer generation) is an
//! external collaborator consumed purely through this request/response
//! contract. The [`BackendClient`] trait is the seam: the gateway crate
//! implements it over HTTP, tests implement it in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::{HistoryEntry, Source, SyllabusData};
use crate::upload::{ProgressReporter, UploadFile};

/// Confirmation returned by a successful document ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReceipt {
    /// Stored filename.
    pub filename: String,
    /// Number of pages parsed.
    #[serde(rename = "pages")]
    pub page_count: u64,
    /// Number of chunks indexed.
    #[serde(rename = "chunks")]
    pub chunk_count: u64,
}

/// Processing phase of one ingested file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPhase {
    Pending,
    Processing,
    Completed,
    Failed,
    NotFound,
}

/// Ingestion status payload for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStatus {
    pub status: IngestPhase,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub chunks: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Status keyed by filename, as returned by the unfiltered status query.
pub type IngestOverview = HashMap<String, IngestStatus>;

/// A question dispatched to the backend.
///
/// Contextual-study requests carry subject/unit/topic; standard requests
/// carry the free-text syllabus context. Absent fields are omitted from the
/// payload entirely, as is an empty history window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabus_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub marks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<Vec<HistoryEntry>>,
}

/// An answer as returned by the backend.
///
/// `error` is a soft flag: the backend produced a displayable answer text
/// but wants it marked (for example, no relevant context was found).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskReply {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub error: bool,
}

/// Raw transport to the backend.
///
/// Implementations perform no input validation and no duplicate detection;
/// both are the gateway's job. Every method suspends at its network call and
/// runs to completion or failure; there is no cancellation.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// `POST /ingest/`: multipart document upload. `progress` receives
    /// transfer percentages in `[0, 99]`.
    async fn ingest_document(
        &self,
        file: &UploadFile,
        progress: &ProgressReporter,
    ) -> Result<DocumentReceipt>;

    /// `GET /ingest/status?filename=`: status of one file.
    async fn ingest_status(&self, filename: &str) -> Result<IngestStatus>;

    /// `GET /ingest/status`: status of every known file.
    async fn ingest_overview(&self) -> Result<IngestOverview>;

    /// `POST /syllabus/upload`: multipart syllabus upload, returns the
    /// parsed structure.
    async fn upload_syllabus(&self, file: &UploadFile) -> Result<SyllabusData>;

    /// `POST /qa/ask` (path configurable): question answering.
    async fn ask(&self, request: &AskRequest) -> Result<AskReply>;

    /// `DELETE /ingest/delete/{filename}`.
    async fn delete_document(&self, filename: &str) -> Result<()>;

    /// `DELETE /ingest/reset`: drop all ingested documents.
    async fn reset_all(&self) -> Result<()>;
}
