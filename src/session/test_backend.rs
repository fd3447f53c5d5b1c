//! In-process stand-in for the analysis backend.
//!
//! Serves `/upload`, `/health` and `/ws/contradictions` on an ephemeral
//! port and replays a scripted sequence of stream frames.

use super::Endpoints;
use crate::config::ServerConfig;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// One scripted server action on the stream.
#[derive(Debug, Clone)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping,
    /// Send a close frame and stop.
    Close,
    /// Drop the connection without a close handshake.
    Hangup,
}

/// What the backend answers.
#[derive(Debug, Clone)]
pub struct Script {
    upload_status: u16,
    upload_body: String,
    frames: Vec<Frame>,
}

impl Script {
    /// Accept every upload with the given session id.
    pub fn accepting(session_id: &str) -> Self {
        Self::upload_reply(200, &format!(r#"{{"session_id":"{}"}}"#, session_id))
    }

    pub fn upload_reply(status: u16, body: &str) -> Self {
        Self {
            upload_status: status,
            upload_body: body.to_string(),
            frames: Vec::new(),
        }
    }

    pub fn frame(mut self, text: &str) -> Self {
        self.frames.push(Frame::Text(text.to_string()));
        self
    }

    pub fn binary(mut self, bytes: &[u8]) -> Self {
        self.frames.push(Frame::Binary(bytes.to_vec()));
        self
    }

    pub fn ping(mut self) -> Self {
        self.frames.push(Frame::Ping);
        self
    }

    pub fn close(mut self) -> Self {
        self.frames.push(Frame::Close);
        self
    }

    pub fn hangup(mut self) -> Self {
        self.frames.push(Frame::Hangup);
        self
    }
}

#[derive(Clone)]
struct BackendState {
    script: Arc<Script>,
    uploads: Arc<Mutex<Vec<Vec<String>>>>,
    sessions: Arc<Mutex<Vec<Option<String>>>>,
}

pub struct MockBackend {
    addr: SocketAddr,
    state: BackendState,
}

impl MockBackend {
    pub async fn start(script: Script) -> Self {
        let state = BackendState {
            script: Arc::new(script),
            uploads: Arc::default(),
            sessions: Arc::default(),
        };

        let app = Router::new()
            .route("/upload", post(upload))
            .route("/ws/contradictions", get(stream))
            .route(
                "/health",
                get(|| async { Json(serde_json::json!({"status": "ok"})) }),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });

        Self { addr, state }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            base_url: format!("http://{}", self.addr),
            timeout_seconds: 5,
            ..ServerConfig::default()
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::from_config(&self.server_config()).expect("mock endpoints")
    }

    /// File names of every upload received, per request.
    pub fn uploads(&self) -> Vec<Vec<String>> {
        self.state.uploads.lock().unwrap().clone()
    }

    /// `session_id` query of every stream connection.
    pub fn stream_sessions(&self) -> Vec<Option<String>> {
        self.state.sessions.lock().unwrap().clone()
    }
}

async fn upload(State(state): State<BackendState>, mut multipart: Multipart) -> (StatusCode, String) {
    let mut names = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let is_file = field.name() == Some("files");
        let name = field.file_name().unwrap_or_default().to_string();
        let _ = field.bytes().await;
        if is_file {
            names.push(name);
        }
    }
    state.uploads.lock().unwrap().push(names);

    let status = StatusCode::from_u16(state.script.upload_status).unwrap_or(StatusCode::OK);
    (status, state.script.upload_body.clone())
}

async fn stream(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<BackendState>,
) -> Response {
    state
        .sessions
        .lock()
        .unwrap()
        .push(params.get("session_id").cloned());
    let frames = state.script.frames.clone();
    ws.on_upgrade(move |socket| play(socket, frames))
}

async fn play(mut socket: WebSocket, frames: Vec<Frame>) {
    for frame in frames {
        match frame {
            Frame::Text(text) => {
                if socket.send(Message::Text(text)).await.is_err() {
                    return;
                }
            }
            Frame::Binary(bytes) => {
                if socket.send(Message::Binary(bytes)).await.is_err() {
                    return;
                }
            }
            Frame::Ping => {
                if socket.send(Message::Ping(b"alive".to_vec())).await.is_err() {
                    return;
                }
            }
            Frame::Close => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            Frame::Hangup => return,
        }
    }

    // Hold the connection until the client leaves.
    while let Some(Ok(_)) = socket.recv().await {}
}
