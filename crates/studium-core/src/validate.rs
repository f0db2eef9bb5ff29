//! Client-side input validation.
//!
//! Every rule here runs before any network call; rejected inputs produce
//! [`StudiumError::InvalidInput`] and never leave the orchestration layer.

use crate::config::{Limits, MarksProfile};
use crate::error::{Result, StudiumError};
use crate::upload::UploadFile;

/// MIME types accepted for document and syllabus uploads.
pub const ACCEPTED_MIME_TYPES: [&str; 2] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// File extensions accepted when no MIME type is available.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["pdf", "docx"];

/// Checks an upload candidate: non-empty, under the size ceiling, and a PDF
/// or DOCX by MIME type or extension.
pub fn validate_upload(file: &UploadFile, limits: &Limits) -> Result<()> {
    if file.name.trim().is_empty() {
        return Err(StudiumError::invalid_input("File has no name"));
    }
    if file.size() == 0 {
        return Err(StudiumError::invalid_input("File is empty"));
    }
    if file.size() > limits.max_upload_bytes {
        let limit_mb = limits.max_upload_bytes as f64 / 1024.0 / 1024.0;
        let got_mb = file.size() as f64 / 1024.0 / 1024.0;
        return Err(StudiumError::invalid_input(format!(
            "File too large (max {limit_mb:.0}MB, got {got_mb:.1}MB)"
        )));
    }

    let mime_ok = file
        .content_type
        .as_deref()
        .is_some_and(|mime| ACCEPTED_MIME_TYPES.contains(&mime));
    let extension_ok = file
        .extension()
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));
    if !mime_ok && !extension_ok {
        return Err(StudiumError::invalid_input(
            "Only PDF and DOCX files are allowed",
        ));
    }

    Ok(())
}

/// Checks a question: non-empty after trimming and within the length cap.
pub fn validate_question(question: &str, limits: &Limits) -> Result<()> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(StudiumError::invalid_input("Question cannot be empty"));
    }
    if trimmed.chars().count() > limits.max_question_chars {
        return Err(StudiumError::invalid_input(format!(
            "Question is too long (max {} characters)",
            limits.max_question_chars
        )));
    }
    Ok(())
}

/// Checks a marks value against the active profile.
pub fn validate_marks(marks: u32, profile: MarksProfile) -> Result<()> {
    if !profile.allows(marks) {
        return Err(StudiumError::invalid_input(format!(
            "Marks must be {}",
            profile.describe()
        )));
    }
    Ok(())
}

/// Checks a backend filename argument.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(StudiumError::invalid_input("Invalid filename"));
    }
    Ok(())
}
