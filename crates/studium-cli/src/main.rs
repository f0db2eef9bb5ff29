use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use studium_application::{ChatOrchestrator, UploadOrchestrator};
use studium_core::config::ClientConfig;
use studium_core::session::SessionStore;
use studium_gateway::{HttpBackendClient, RequestGateway};

mod commands;

#[derive(Parser)]
#[command(name = "studium")]
#[command(about = "Studium - chat with your study documents", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config file and STUDIUM_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a study document (PDF or DOCX) for indexing
    Upload {
        /// Path to the document
        file: PathBuf,
    },
    /// Upload a syllabus and show the parsed units
    Syllabus {
        /// Path to the syllabus (PDF or DOCX)
        file: PathBuf,
    },
    /// Ask a single question
    Ask {
        /// The question text
        question: String,
        #[command(flatten)]
        study: commands::StudyArgs,
    },
    /// Interactive question-answering session
    Chat {
        #[command(flatten)]
        study: commands::StudyArgs,
    },
    /// Show ingestion status, for one file or all of them
    Status {
        /// Restrict to one uploaded file
        filename: Option<String>,
    },
    /// Delete one uploaded document
    Delete {
        /// Filename as reported at upload time
        filename: String,
    },
    /// Remove all uploaded documents and reset the session
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("studium=warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }

    let transport = Arc::new(HttpBackendClient::new(config.clone())?);
    let gateway = Arc::new(RequestGateway::new(transport, &config));
    let store = Arc::new(SessionStore::new());
    let uploads = UploadOrchestrator::new(gateway.clone(), store.clone());
    let chat = ChatOrchestrator::new(gateway, store.clone());

    match cli.command {
        Commands::Upload { file } => commands::upload(&uploads, &file).await,
        Commands::Syllabus { file } => commands::syllabus(&uploads, &file).await,
        Commands::Ask { question, study } => {
            commands::apply_study_args(&chat, &store, study).await;
            commands::ask(&chat, &question).await
        }
        Commands::Chat { study } => {
            commands::apply_study_args(&chat, &store, study).await;
            commands::chat(&chat).await
        }
        Commands::Status { filename } => commands::status(&uploads, filename.as_deref()).await,
        Commands::Delete { filename } => commands::delete(&uploads, &filename).await,
        Commands::Reset => commands::reset(&uploads).await,
    }
}
