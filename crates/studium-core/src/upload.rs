//! Upload state machine values and progress reporting.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StudiumError};

/// Progress values are capped here until the server confirms completion;
/// 100 is never asserted client-side.
pub const TRANSFER_PROGRESS_CAP: u8 = 99;

/// State of one upload target (document or syllabus).
///
/// `Idle -> Validating -> Transferring -> {Indexed | Failed}`; `Failed` is
/// terminal until a new file selection re-enters `Validating`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UploadState {
    /// No upload attempted yet, or a finished one acknowledged.
    Idle,
    /// Client-side checks running on the selected file.
    Validating,
    /// Bytes in flight; carries transfer progress in `[0, 99]`.
    Transferring { progress: u8 },
    /// Server confirmed ingestion.
    Indexed,
    /// Validation or transfer failed.
    Failed { reason: String },
}

impl UploadState {
    /// Whether a transfer is currently in flight.
    pub fn is_transferring(&self) -> bool {
        matches!(self, Self::Transferring { .. })
    }

    /// Whether the state is a terminal outcome of an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Indexed | Self::Failed { .. })
    }
}

/// A file selected for upload.
///
/// The bytes are held in memory; the validation layer caps uploads at 50 MB
/// well before this becomes a concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name as presented to the backend.
    pub name: String,
    /// MIME type when the selection source knows it.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

impl UploadFile {
    /// Wraps in-memory bytes as an upload.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data,
        }
    }

    /// Reads a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StudiumError::invalid_input("File path has no usable file name"))?
            .to_string();
        let data = tokio::fs::read(path).await?;
        Ok(Self {
            name,
            content_type: None,
            data,
        })
    }

    /// Attaches a known MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Handle through which the gateway reports transfer progress.
///
/// Reports are clamped to `[0, 99]` and monotonically non-decreasing;
/// regressions and repeats are dropped so observers see a clean ramp. The
/// terminal transition (`Indexed`/`Failed`) is the orchestrator's, never the
/// reporter's.
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<dyn Fn(u8) + Send + Sync>,
    last: Arc<AtomicU8>,
}

impl ProgressReporter {
    /// Creates a reporter feeding `sink` with each new progress value.
    pub fn new(sink: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
            last: Arc::new(AtomicU8::new(0)),
        }
    }

    /// A reporter that discards all updates (single-shot uploads).
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Reports transfer progress as a percentage.
    pub fn report(&self, percent: u8) {
        let clamped = percent.min(TRANSFER_PROGRESS_CAP);
        let previous = self.last.fetch_max(clamped, Ordering::SeqCst);
        if clamped > previous || (clamped == 0 && previous == 0) {
            (self.sink)(clamped);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("last", &self.last.load(Ordering::SeqCst))
            .finish()
    }
}
