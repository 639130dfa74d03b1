//! WebSocket transport for Matchroom.
//!
//! The transport owns the listen socket and every client connection.
//! Each accepted connection gets a reader loop (feeding frames to a
//! [`ConnectionHandler`]) and a dedicated write pump, so a slow client
//! never blocks anything but its own session. The handler seam is where
//! the node glue plugs in request routing.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{ConnectionHandler, WsServer, WsSession, SEND_BUFFER};
