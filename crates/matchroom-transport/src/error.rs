//! Error types for the transport layer.

/// Errors that can occur while running the WebSocket server.
///
/// Per-connection failures (handshake, read, write) are logged and end
/// only that connection; they never surface here.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listen socket failed.
    #[error("bind failed: {0}")]
    Bind(std::io::Error),

    /// Reading the bound local address failed.
    #[error("local address unavailable: {0}")]
    LocalAddr(std::io::Error),
}
