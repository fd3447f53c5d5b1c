//! Session view and the reducer that folds stream events into it.
//!
//! [`reduce`] is pure: `(SessionState, StreamEvent) -> SessionState`.
//! Everything stateful about a session lives in [`SessionState`], which
//! renderers only ever read.

use super::protocol::{SessionId, StreamEvent};
use crate::models::ContradictionRecord;
use std::collections::VecDeque;
use std::fmt;

/// Displayed status of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Info(String),
    /// Error reported by the backend. Not terminal: analysis may go on.
    Error(String),
    Done,
    /// The upload failed; analysis never started.
    SubmissionFailed(String),
    /// The stream broke or closed without `done`.
    ChannelFailed,
    /// The user abandoned the session.
    Cancelled,
}

impl Status {
    /// Whether no further event can change this session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Done | Status::SubmissionFailed(_) | Status::ChannelFailed | Status::Cancelled
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "Idle"),
            Status::Uploading => write!(f, "Uploading..."),
            Status::Analyzing => write!(f, "Analyzing..."),
            Status::Info(message) => write!(f, "{}", message),
            Status::Error(message) => write!(f, "Error: {}", message),
            Status::Done => write!(f, "Done"),
            Status::SubmissionFailed(message) => write!(f, "Upload failed: {}", message),
            Status::ChannelFailed => write!(f, "WebSocket error"),
            Status::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Analysis progress as last reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.processed, self.total)
    }
}

/// Everything a renderer needs to show one session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub status: Status,
    /// Absent until the first progress event.
    pub progress: Option<Progress>,
    /// Received contradictions, newest first.
    pub results: VecDeque<ContradictionRecord>,
    /// Set once the upload succeeds.
    pub session_id: Option<SessionId>,
}

impl SessionState {
    /// Fresh state for a session whose upload has just begun.
    pub fn uploading() -> Self {
        Self {
            status: Status::Uploading,
            ..Self::default()
        }
    }

    /// Results in arrival order (oldest first).
    pub fn results_in_arrival_order(&self) -> Vec<ContradictionRecord> {
        self.results.iter().rev().cloned().collect()
    }
}

/// Apply one event to the session state.
///
/// Terminal states absorb every event. Contradictions are prepended,
/// never merged; progress replaces the previous pair.
pub fn reduce(mut state: SessionState, event: StreamEvent) -> SessionState {
    if state.status.is_terminal() {
        return state;
    }

    match event {
        StreamEvent::Contradiction(record) => state.results.push_front(record),
        StreamEvent::Progress { processed, total } => {
            state.progress = Some(Progress { processed, total });
        }
        StreamEvent::Info { message } => state.status = Status::Info(message),
        StreamEvent::Error { message } => state.status = Status::Error(message),
        StreamEvent::Done => state.status = Status::Done,
        StreamEvent::Unrecognized => {}
    }

    state
}
