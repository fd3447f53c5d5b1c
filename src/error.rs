//! Error types for the upload and stream boundaries.
//!
//! Every failure is caught where it occurs and turned into a session
//! status; none of these propagate past the session manager.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The upload call failed or returned an unexpected shape.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// A selected file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend could not be reached.
    #[error("Cannot connect to the analysis backend at {url}. Is it running?")]
    Connect { url: String },

    /// The upload did not complete in time.
    #[error("Upload timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Any other transport failure.
    #[error("Failed to send upload request: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend rejected upload ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body was not the expected structure.
    #[error("Unexpected upload response: {0}")]
    InvalidResponse(String),
}

impl SubmissionError {
    /// Classify a reqwest error the way the user should read it.
    pub fn from_request(err: reqwest::Error, url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            SubmissionError::Timeout {
                seconds: timeout_seconds,
            }
        } else if err.is_connect() {
            SubmissionError::Connect {
                url: url.to_string(),
            }
        } else {
            SubmissionError::Transport(err)
        }
    }
}

/// Transport-level failure of the result stream.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The WebSocket handshake failed.
    #[error("WebSocket connect failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    /// The connection failed after it was established.
    #[error("WebSocket transport error: {0}")]
    Transport(#[source] tokio_tungstenite::tungstenite::Error),

    /// The server closed the stream before sending `done`.
    #[error("Stream closed before analysis finished")]
    ClosedEarly,

    /// No frame arrived within the configured idle limit.
    #[error("No stream activity for {}s", .0.as_secs())]
    IdleTimeout(Duration),
}
