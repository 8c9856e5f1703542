//! Thin WebSocket client
//!
//! Wraps one tokio-tungstenite connection: connect, receive text frames,
//! answer pings, close. Stream URLs are built by the callers.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};

use crate::error::{FeedError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsClient {
    stream: Option<WsStream>,
}

impl WsClient {
    pub fn new() -> Self {
        Self { stream: None }
    }

    pub async fn connect(&mut self, url: &str) -> Result<()> {
        let (ws_stream, response) = connect_async(url)
            .await
            .map_err(|e| FeedError::WsConnection(format!("failed to connect: {e}")))?;

        debug!(status = ?response.status(), url, "websocket connected");
        self.stream = Some(ws_stream);

        Ok(())
    }

    /// Receive the next frame. Returns the payload for data frames and
    /// `None` for control frames; a close frame or transport error ends the
    /// connection.
    pub async fn recv(&mut self) -> Result<Option<String>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| FeedError::WsConnection("not connected".to_string()))?;

        match stream.next().await {
            Some(Ok(Message::Text(text))) => Ok(Some(text)),
            Some(Ok(Message::Binary(data))) => {
                Ok(Some(String::from_utf8_lossy(&data).to_string()))
            }
            Some(Ok(Message::Ping(data))) => {
                if let Some(stream) = self.stream.as_mut() {
                    let _ = stream.send(Message::Pong(data)).await;
                }
                Ok(None)
            }
            Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => Ok(None),
            Some(Ok(Message::Close(frame))) => {
                warn!(frame = ?frame, "received close frame");
                self.stream = None;
                Err(FeedError::WsConnection("connection closed".to_string()))
            }
            Some(Err(e)) => {
                self.stream = None;
                Err(FeedError::WsMessage(e.to_string()))
            }
            None => {
                self.stream = None;
                Err(FeedError::WsConnection("stream ended".to_string()))
            }
        }
    }

    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
