//! HTTP implementation of the backend contract.
//!
//! Thin reqwest client: one method per REST operation, shared status-code
//! mapping that surfaces the backend's `detail` message when the error body
//! carries one.

use futures::stream;
use reqwest::{Client, Response, StatusCode, Url, multipart};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use async_trait::async_trait;
use studium_core::backend::{
    AskReply, AskRequest, BackendClient, DocumentReceipt, IngestOverview, IngestStatus,
};
use studium_core::config::ClientConfig;
use studium_core::error::{Result, StudiumError};
use studium_core::session::SyllabusData;
use studium_core::upload::{ProgressReporter, UploadFile};

/// Upload bodies are streamed in chunks of this size so transfer progress
/// has something to tick on.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// [`BackendClient`] over HTTP.
pub struct HttpBackendClient {
    client: Client,
    config: ClientConfig,
}

impl HttpBackendClient {
    /// Builds a client from deployment configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| StudiumError::config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }

    /// Builds the multipart part for an upload, streaming the bytes so the
    /// reporter sees the transfer advance. The last chunk reports 100, which
    /// the reporter caps at 99; completion is only ever server-confirmed.
    fn upload_part(file: &UploadFile, progress: &ProgressReporter) -> Result<multipart::Part> {
        let total = file.size().max(1);
        let mut sent: u64 = 0;
        let chunks: Vec<(Vec<u8>, u64)> = file
            .data
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(|chunk| {
                sent += chunk.len() as u64;
                (chunk.to_vec(), sent)
            })
            .collect();

        let reporter = progress.clone();
        let body_stream = stream::iter(chunks.into_iter().map(move |(chunk, sent)| {
            reporter.report(((sent * 100) / total) as u8);
            Ok::<Vec<u8>, std::io::Error>(chunk)
        }));

        let mut part =
            multipart::Part::stream_with_length(reqwest::Body::wrap_stream(body_stream), file.size())
                .file_name(file.name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|err| {
                StudiumError::invalid_input(format!("Unusable MIME type: {err}"))
            })?;
        }
        Ok(part)
    }

    fn delete_url(&self, filename: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint("/ingest/delete"))
            .map_err(|err| StudiumError::config(format!("Invalid base URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| StudiumError::config("Base URL cannot carry paths"))?
            .push(filename);
        Ok(url)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn ingest_document(
        &self,
        file: &UploadFile,
        progress: &ProgressReporter,
    ) -> Result<DocumentReceipt> {
        tracing::debug!(filename = %file.name, bytes = file.size(), "uploading document");
        let form = multipart::Form::new().part("file", Self::upload_part(file, progress)?);
        let response = self
            .client
            .post(self.config.endpoint("/ingest/"))
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }

    async fn ingest_status(&self, filename: &str) -> Result<IngestStatus> {
        let response = self
            .client
            .get(self.config.endpoint("/ingest/status"))
            .query(&[("filename", filename)])
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }

    async fn ingest_overview(&self) -> Result<IngestOverview> {
        let response = self
            .client
            .get(self.config.endpoint("/ingest/status"))
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }

    async fn upload_syllabus(&self, file: &UploadFile) -> Result<SyllabusData> {
        tracing::debug!(filename = %file.name, "uploading syllabus");
        // single-shot upload, no progress reporting
        let mut part = multipart::Part::bytes(file.data.clone()).file_name(file.name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|err| {
                StudiumError::invalid_input(format!("Unusable MIME type: {err}"))
            })?;
        }
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.config.endpoint("/syllabus/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskReply> {
        let response = self
            .client
            .post(self.config.ask_url())
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_json(response).await
    }

    async fn delete_document(&self, filename: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.delete_url(filename)?)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_ack(response).await
    }

    async fn reset_all(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.config.endpoint("/ingest/reset"))
            .send()
            .await
            .map_err(map_transport_error)?;
        read_ack(response).await
    }
}

/// FastAPI-style error body.
#[derive(Deserialize)]
struct ErrorResponse {
    detail: String,
}

fn map_transport_error(err: reqwest::Error) -> StudiumError {
    let retryable = err.is_connect() || err.is_timeout();
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    StudiumError::network(message, retryable)
}

fn map_http_error(status: StatusCode, body: String) -> StudiumError {
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.detail)
        .unwrap_or_else(|_| body.trim().to_string());
    StudiumError::backend(status.as_u16(), detail)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read backend error body".to_string());
        return Err(map_http_error(status, body));
    }
    response
        .json::<T>()
        .await
        .map_err(|err| StudiumError::internal(format!("Failed to parse backend response: {err}")))
}

async fn read_ack(response: Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read backend error body".to_string());
        return Err(map_http_error(status, body));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_extracts_fastapi_detail() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Only PDF and DOCX files are allowed"}"#.to_string(),
        );
        match err {
            StudiumError::Backend { status, detail } => {
                assert_eq!(status, 400);
                assert_eq!(detail, "Only PDF and DOCX files are allowed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_http_error_falls_back_to_raw_body() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream exploded".to_string());
        assert_eq!(err.user_message(), "upstream exploded");
    }

    #[test]
    fn test_delete_url_encodes_filename() {
        let client = HttpBackendClient::new(ClientConfig::default()).unwrap();
        let url = client.delete_url("my notes v2.pdf").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/ingest/delete/my%20notes%20v2.pdf"
        );
    }

    #[test]
    fn test_upload_part_reports_progress_lazily() {
        // building the part must not consume the stream; no progress yet
        let file = UploadFile::from_bytes("notes.pdf", vec![0u8; 200 * 1024]);
        let reporter = ProgressReporter::new(|pct| {
            panic!("no chunk should be pulled at build time, got {pct}")
        });
        let part = HttpBackendClient::upload_part(&file, &reporter);
        assert!(part.is_ok());
    }
}
