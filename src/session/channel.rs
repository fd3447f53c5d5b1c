//! Receive-only WebSocket subscription to the result stream.

use crate::error::ChannelError;
use futures::{Stream, StreamExt};
use reqwest::Url;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

/// An open push channel for one session.
pub struct Subscription {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    idle_timeout: Option<Duration>,
}

/// Open the stream at `url`.
pub async fn subscribe(url: &Url, idle_timeout: Option<Duration>) -> Result<Subscription, ChannelError> {
    debug!("Opening result stream: {}", url);

    let (socket, response) = connect_async(url.as_str())
        .await
        .map_err(ChannelError::Connect)?;

    debug!("Result stream established ({})", response.status());

    Ok(Subscription {
        socket,
        idle_timeout,
    })
}

impl Subscription {
    /// Next text payload, `None` once the server closes the stream.
    pub async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, self.socket.next()).await {
                    Ok(next) => next,
                    Err(_) => return Some(Err(ChannelError::IdleTimeout(limit))),
                },
                None => self.socket.next().await,
            };

            match next? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Dropping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!("Server closed the stream: {:?}", frame);
                    return None;
                }
                // Pings are answered by the transport.
                Ok(_) => continue,
                Err(e) => return Some(Err(ChannelError::Transport(e))),
            }
        }
    }

    /// Adapt into a stream of text payloads.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, ChannelError>> {
        futures::stream::unfold(self, |mut subscription| async move {
            let frame = subscription.next_frame().await?;
            Some((frame, subscription))
        })
    }
}
