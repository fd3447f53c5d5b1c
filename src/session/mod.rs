//! Upload-and-stream session management.
//!
//! A session starts with one multipart upload ([`SessionInitiator`]),
//! which yields a session id. A WebSocket subscription keyed by that id
//! then feeds typed events into the [`StreamReconciler`], which owns the
//! [`SessionState`] renderers watch.

pub mod channel;
pub mod initiator;
pub mod protocol;
pub mod reconciler;
pub mod state;

#[cfg(test)]
pub(crate) mod test_backend;

pub use initiator::SessionInitiator;
pub use protocol::SessionId;
pub use reconciler::{SessionTicket, StreamReconciler};
pub use state::{SessionState, Status};

use crate::config::ServerConfig;
use crate::scanner::DocumentFile;
use anyhow::{Context, Result};
use reqwest::Url;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Backend URLs derived from the server configuration.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub upload: Url,
    pub health: Url,
    /// WebSocket URL without the session query.
    pub stream: Url,
}

impl Endpoints {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let base = config.base_url.trim_end_matches('/');
        let join = |path: &str| -> Result<Url> {
            let url = format!("{}{}", base, path);
            Url::parse(&url).with_context(|| format!("Invalid backend URL: {}", url))
        };

        let upload = join(&config.upload_path)?;
        let health = join(&config.health_path)?;
        let mut stream = join(&config.stream_path)?;

        let ws_scheme = match stream.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(anyhow::anyhow!("Unsupported backend scheme: {}", other)),
        };
        stream
            .set_scheme(ws_scheme)
            .map_err(|_| anyhow::anyhow!("Cannot derive stream URL from {}", base))?;

        Ok(Self {
            upload,
            health,
            stream,
        })
    }

    /// Stream URL for one session.
    pub fn stream_for(&self, session_id: &SessionId) -> Url {
        let mut url = self.stream.clone();
        url.query_pairs_mut()
            .append_pair("session_id", session_id.as_str());
        url
    }
}

/// Runs sessions end to end: upload, subscribe, reconcile.
pub struct SessionManager {
    initiator: SessionInitiator,
    reconciler: StreamReconciler,
    idle_timeout: Option<Duration>,
}

impl SessionManager {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let endpoints = Endpoints::from_config(config)?;
        Ok(Self {
            initiator: SessionInitiator::new(endpoints, config.timeout_seconds)?,
            reconciler: StreamReconciler::new(),
            idle_timeout: config.idle_timeout_seconds.map(Duration::from_secs),
        })
    }

    /// Read-only view for renderers.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.reconciler.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.reconciler.snapshot()
    }

    /// Upload `files` and obtain a session id.
    ///
    /// With no files this does nothing. A failed upload leaves the
    /// session in a terminal `SubmissionFailed` status and returns `None`.
    pub async fn start(&mut self, files: &[DocumentFile]) -> Option<(SessionTicket, SessionId)> {
        let ticket = self.reconciler.begin_upload(files.len())?;
        let outcome = self.initiator.submit(files).await;
        let session_id = self.reconciler.complete_upload(ticket, outcome)?;
        Some((ticket, session_id))
    }

    /// Subscribe to the session's stream and reconcile until it ends.
    pub async fn attach(&mut self, ticket: SessionTicket, session_id: &SessionId) -> SessionState {
        let url = self.initiator.endpoints().stream_for(session_id);

        match channel::subscribe(&url, self.idle_timeout).await {
            Ok(subscription) => {
                self.reconciler.stream_opened(ticket);
                self.reconciler
                    .consume(ticket, subscription.into_stream())
                    .await
            }
            Err(e) => {
                self.reconciler.channel_failed(ticket, &e);
                self.snapshot()
            }
        }
    }

    /// Upload, then stream results until a terminal status.
    pub async fn run(&mut self, files: &[DocumentFile]) -> SessionState {
        match self.start(files).await {
            Some((ticket, session_id)) => self.attach(ticket, &session_id).await,
            None => {
                debug!("Session did not start");
                self.snapshot()
            }
        }
    }

    /// Stop caring about the current session.
    pub fn abandon(&mut self) {
        self.reconciler.abandon();
    }
}
