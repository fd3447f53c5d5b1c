//! Owner of the active [`SessionState`].
//!
//! Every input that can change the view (upload outcome, stream opened,
//! frame, channel failure) arrives here together with the
//! [`SessionTicket`] of the session it belongs to. Inputs carrying a
//! ticket from an earlier session are dropped, so a late upload response
//! or a leftover frame can never resurrect an abandoned session.
//!
//! Readers get a [`watch::Receiver`]; only this type writes.

use super::initiator::Submission;
use super::protocol::{parse_frame, SessionId, StreamEvent};
use super::state::{reduce, SessionState, Status};
use crate::error::{ChannelError, SubmissionError};
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Identifies one upload-and-stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    generation: u64,
}

/// Whether the subscription should stay open after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Folds session inputs into the published [`SessionState`].
pub struct StreamReconciler {
    state: watch::Sender<SessionState>,
    generation: u64,
}

impl Default for StreamReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamReconciler {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state,
            generation: 0,
        }
    }

    /// Read-only view of the session state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn is_current(&self, ticket: SessionTicket) -> bool {
        ticket.generation == self.generation
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Begin a new session for `file_count` documents.
    ///
    /// Returns `None` and leaves the state untouched when there is
    /// nothing to upload or an upload is still in flight. Otherwise the
    /// previous session's results and progress are discarded before
    /// anything else happens.
    pub fn begin_upload(&mut self, file_count: usize) -> Option<SessionTicket> {
        if file_count == 0 {
            debug!("No documents selected, nothing to analyze");
            return None;
        }

        if self.state.borrow().status == Status::Uploading {
            warn!("An upload is already in progress; ignoring new request");
            return None;
        }

        self.generation += 1;
        self.publish(SessionState::uploading());

        Some(SessionTicket {
            generation: self.generation,
        })
    }

    /// Record the outcome of the upload call.
    ///
    /// Returns the session id to subscribe with, or `None` when the upload
    /// failed or the ticket is stale.
    pub fn complete_upload(
        &mut self,
        ticket: SessionTicket,
        outcome: Result<Submission, SubmissionError>,
    ) -> Option<SessionId> {
        if !self.is_current(ticket) {
            debug!("Discarding upload result for an abandoned session");
            return None;
        }

        match outcome {
            Ok(submission) => {
                info!(
                    "Analysis session {} started ({} document(s) accepted)",
                    submission.session_id, submission.accepted
                );
                let session_id = submission.session_id;
                self.state.send_modify(|state| {
                    state.session_id = Some(session_id.clone());
                });
                Some(session_id)
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                self.state.send_modify(|state| {
                    state.status = Status::SubmissionFailed(e.to_string());
                });
                None
            }
        }
    }

    /// The subscription is established.
    pub fn stream_opened(&mut self, ticket: SessionTicket) {
        if !self.is_current(ticket) {
            return;
        }
        self.state.send_modify(|state| {
            if !state.status.is_terminal() {
                state.status = Status::Analyzing;
            }
        });
    }

    /// Decode and apply one text frame. Malformed frames are dropped.
    pub fn apply_frame(&mut self, ticket: SessionTicket, text: &str) -> Flow {
        if !self.is_current(ticket) {
            debug!("Ignoring frame from a stale stream");
            return Flow::Close;
        }

        match parse_frame(text) {
            Ok(event) => self.apply_event(ticket, event),
            Err(e) => {
                debug!("Dropping malformed frame: {}", e);
                self.flow()
            }
        }
    }

    /// Apply one decoded event.
    pub fn apply_event(&mut self, ticket: SessionTicket, event: StreamEvent) -> Flow {
        if !self.is_current(ticket) {
            debug!("Ignoring event from a stale stream");
            return Flow::Close;
        }

        if event == StreamEvent::Unrecognized {
            debug!("Ignoring unrecognized stream event");
            return self.flow();
        }

        let state = reduce(self.snapshot(), event);
        self.publish(state);
        self.flow()
    }

    /// The channel failed or closed before `done`.
    pub fn channel_failed(&mut self, ticket: SessionTicket, error: &ChannelError) {
        if !self.is_current(ticket) {
            return;
        }
        warn!("Result stream failed: {}", error);
        self.state.send_modify(|state| {
            if !state.status.is_terminal() {
                state.status = Status::ChannelFailed;
            }
        });
    }

    /// Drop interest in the current session.
    ///
    /// Anything still in flight for it is discarded when it arrives.
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.state.send_modify(|state| {
            if !state.status.is_terminal() {
                state.status = Status::Cancelled;
            }
        });
    }

    fn flow(&self) -> Flow {
        if self.state.borrow().status.is_terminal() {
            Flow::Close
        } else {
            Flow::Continue
        }
    }

    /// Consume frames until the session reaches a terminal status.
    ///
    /// Frames are applied one at a time in arrival order. The stream is
    /// dropped, closing the subscription, on return.
    pub async fn consume<S>(&mut self, ticket: SessionTicket, frames: S) -> SessionState
    where
        S: Stream<Item = Result<String, ChannelError>>,
    {
        let mut frames = std::pin::pin!(frames);

        loop {
            match frames.next().await {
                Some(Ok(text)) => {
                    if self.apply_frame(ticket, &text) == Flow::Close {
                        break;
                    }
                }
                Some(Err(e)) => {
                    self.channel_failed(ticket, &e);
                    break;
                }
                None => {
                    self.channel_failed(ticket, &ChannelError::ClosedEarly);
                    break;
                }
            }
        }

        self.snapshot()
    }
}
