//! Command implementations for the studium binary.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use studium_application::{ChatOrchestrator, StudyMode, TurnOutcome, UploadOrchestrator};
use studium_core::config::MarksProfile;
use studium_core::session::{Message, SessionStore};
use studium_core::upload::{UploadFile, UploadState};

/// Study-context selection shared by `ask` and `chat`.
#[derive(Args)]
pub struct StudyArgs {
    /// Subject (enables contextual study mode together with unit and topic)
    #[arg(long)]
    pub subject: Option<String>,
    /// Syllabus unit
    #[arg(long)]
    pub unit: Option<String>,
    /// Topic within the unit
    #[arg(long)]
    pub topic: Option<String>,
    /// Answer length in marks
    #[arg(long)]
    pub marks: Option<u32>,
}

/// Applies the selection to the session and picks the study mode:
/// contextual when a subject/unit/topic selection was given, standard
/// otherwise.
pub async fn apply_study_args(chat: &ChatOrchestrator, store: &Arc<SessionStore>, args: StudyArgs) {
    let contextual = args.subject.is_some() || args.unit.is_some() || args.topic.is_some();
    if let Some(subject) = args.subject {
        store.select_subject(subject).await;
    }
    if let Some(unit) = args.unit {
        store.select_unit(unit).await;
    }
    if let Some(topic) = args.topic {
        store.select_topic(topic).await;
    }
    if let Some(marks) = args.marks {
        store.select_marks(marks).await;
        if let Some(hint) = MarksProfile::answer_length_hint(marks) {
            println!("Answer length: {marks} marks - {hint}");
        }
    }
    if contextual {
        chat.set_mode(StudyMode::Contextual).await;
    }
}

pub async fn upload(uploads: &UploadOrchestrator, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path).await?;
    let mut states = uploads.document_state();
    let watcher = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match state {
                UploadState::Transferring { progress } => {
                    print!("\rUploading... {progress:3}%");
                    let _ = std::io::stdout().flush();
                }
                UploadState::Indexed => {
                    println!("\rUpload complete.     ");
                    break;
                }
                UploadState::Failed { reason } => {
                    println!("\rUpload failed: {reason}");
                    break;
                }
                _ => {}
            }
        }
    });

    let result = uploads.ingest_document(file).await;
    let _ = watcher.await;
    let receipt = result?;
    println!(
        "Indexed {} ({} pages, {} chunks). Ask away.",
        receipt.filename, receipt.page_count, receipt.chunk_count
    );
    Ok(())
}

pub async fn syllabus(uploads: &UploadOrchestrator, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path).await?;
    let syllabus = uploads.ingest_syllabus(file).await?;
    println!("Subject: {}", syllabus.subject);
    for unit in &syllabus.units {
        println!("  {} [{}]", unit.name, unit.format);
        for topic in &unit.topics {
            println!("    - {topic}");
        }
    }
    Ok(())
}

pub async fn ask(chat: &ChatOrchestrator, question: &str) -> Result<()> {
    let outcome = chat.ask(question).await?;
    print_outcome(&outcome);
    Ok(())
}

pub async fn chat(chat: &ChatOrchestrator) -> Result<()> {
    println!("Interactive session - empty line or 'exit' to leave.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() || question == "exit" || question == "quit" {
            break;
        }
        match chat.ask(question).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(err) => println!("{}", err.user_message()),
        }
    }
    Ok(())
}

pub async fn status(uploads: &UploadOrchestrator, filename: Option<&str>) -> Result<()> {
    match filename {
        Some(filename) => {
            let status = uploads.ingest_status(filename).await?;
            println!("{filename}: {:?}, {} pages, {} chunks", status.status, status.pages, status.chunks);
            if let Some(error) = status.error {
                println!("  error: {error}");
            }
        }
        None => {
            let overview = uploads.ingest_overview().await?;
            if overview.is_empty() {
                println!("No uploaded documents.");
            }
            for (name, status) in overview {
                println!("{name}: {:?}, {} pages, {} chunks", status.status, status.pages, status.chunks);
            }
        }
    }
    Ok(())
}

pub async fn delete(uploads: &UploadOrchestrator, filename: &str) -> Result<()> {
    uploads.delete_document(filename).await?;
    println!("Deleted {filename}.");
    Ok(())
}

pub async fn reset(uploads: &UploadOrchestrator) -> Result<()> {
    uploads.reset().await?;
    println!("All documents removed and session cleared.");
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Answered(message) => print_answer(message),
        TurnOutcome::Failed(message) => println!("Turn failed: {}", message.content),
        TurnOutcome::Blocked(missing) => {
            println!("Select your study context first. Missing:");
            for item in missing {
                println!("  - {item}");
            }
        }
    }
}

fn print_answer(message: &Message) {
    if message.error {
        println!("(flagged) {}", message.content);
    } else {
        println!("{}", message.content);
    }
    if !message.sources.is_empty() {
        println!("Sources:");
        for source in &message.sources {
            println!("  p.{}: {}", source.page, source.text);
        }
    }
}
