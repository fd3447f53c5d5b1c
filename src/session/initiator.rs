//! Upload call that starts a remote analysis job.

use super::protocol::{SessionId, UploadResponse};
use super::Endpoints;
use crate::error::SubmissionError;
use crate::scanner::DocumentFile;
use anyhow::Context;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Multipart field shared by every uploaded document.
const FILES_FIELD: &str = "files";

/// A successful upload.
#[derive(Debug, Clone)]
pub struct Submission {
    pub session_id: SessionId,
    pub accepted: usize,
}

/// Submits documents to the backend's upload endpoint.
pub struct SessionInitiator {
    client: reqwest::Client,
    endpoints: Endpoints,
    timeout_seconds: u64,
}

impl SessionInitiator {
    /// Create an initiator with the given request timeout.
    pub fn new(endpoints: Endpoints, timeout_seconds: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoints,
            timeout_seconds,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Upload all documents in one multipart request.
    ///
    /// Exactly one request is made and it is never retried.
    pub async fn submit(&self, files: &[DocumentFile]) -> Result<Submission, SubmissionError> {
        let url = self.endpoints.upload.as_str();
        let form = build_form(files).await?;

        info!("Uploading {} document(s) to {}", files.len(), url);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::from_request(e, url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::from_request(e, url, self.timeout_seconds))?;

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| SubmissionError::InvalidResponse(e.to_string()))?;

        let accepted = parsed.count.unwrap_or(files.len());
        if accepted != files.len() {
            warn!(
                "Backend accepted {} of {} uploaded document(s)",
                accepted,
                files.len()
            );
        }

        debug!("Upload accepted, session {}", parsed.session_id);

        Ok(Submission {
            session_id: parsed.session_id,
            accepted,
        })
    }

    /// Probe the backend's health endpoint.
    pub async fn health(&self) -> anyhow::Result<()> {
        #[derive(Deserialize)]
        struct Health {
            status: String,
        }

        let url = self.endpoints.health.as_str();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SubmissionError::from_request(e, url, self.timeout_seconds))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Health check failed: HTTP {}", response.status()));
        }

        let health: Health = response
            .json()
            .await
            .context("Failed to parse health response")?;

        if health.status != "ok" {
            return Err(anyhow::anyhow!("Backend reports status '{}'", health.status));
        }

        Ok(())
    }
}

async fn build_form(files: &[DocumentFile]) -> Result<Form, SubmissionError> {
    let mut form = Form::new();

    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| SubmissionError::ReadFile {
                path: file.path.clone(),
                source,
            })?;

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(content_type(file))
            .map_err(SubmissionError::Transport)?;

        form = form.part(FILES_FIELD, part);
    }

    Ok(form)
}

fn content_type(file: &DocumentFile) -> &'static str {
    match file.extension().as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}
