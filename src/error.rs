use thiserror::Error;

// Basic error handling with thiserror
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("WebSocket channel failed: {0}")]
    ChannelFailed(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parsing failed: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("Media playback failed: {0}")]
    MediaFailed(String),

    #[error("Connection explicitly closed")]
    ConnectionClosed,

    #[error("Rendering surface host disconnected")]
    SurfaceClosed,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task panicked or cancelled")]
    TaskJoinError(#[from] tokio::task::JoinError),
}
