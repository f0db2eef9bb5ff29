//! Studium application layer.
//!
//! Use cases wiring the request gateway and the session store together:
//! upload orchestration (document and syllabus ingestion) and chat turn
//! orchestration.

mod chat;
mod upload;

pub use chat::{ChatOrchestrator, Precondition, StudyMode, TurnOutcome};
pub use upload::UploadOrchestrator;
