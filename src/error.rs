//! Error types for the feed handler

use thiserror::Error;

/// Feed handler errors
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("websocket connection error: {0}")]
    WsConnection(String),

    #[error("websocket message error: {0}")]
    WsMessage(String),

    #[error("failed to decode message: {0}")]
    Decode(String),

    #[error("snapshot request failed: {0}")]
    Rest(String),

    #[error("snapshot rejected: HTTP {0}")]
    RestStatus(u16),

    #[error("publish sink error: {0}")]
    Sink(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::WsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Rest(err.to_string())
    }
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::Sink(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
