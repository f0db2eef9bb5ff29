//! Session domain module.
//!
//! This module contains the session-state aggregate and the types that flow
//! through it.
//!
//! # Module Structure
//!
//! - `message`: message log types (`MessageRole`, `Message`, `Source`) and
//!   the backend history window
//! - `syllabus`: parsed syllabus model (`SyllabusData`, `SyllabusUnit`)
//! - `store`: the observable session store (`SessionContext`, `SessionStore`)

mod message;
mod store;
mod syllabus;

// Re-export public API
pub use message::{HistoryEntry, Message, MessageRole, Source, history_window};
pub use store::{SessionContext, SessionStore};
pub use syllabus::{SyllabusData, SyllabusUnit};
