//! WebSocket server and the [`Session`] implementation it produces.
//!
//! Built on `tokio-tungstenite`. Connection anatomy:
//!
//! - a **reader loop** on the accepting task, decoding frames and handing
//!   them to the [`ConnectionHandler`];
//! - a **write pump** task consuming a bounded outbound queue, so
//!   [`Session::send`] is a non-blocking enqueue from any thread;
//! - a [`WsSession`] handle shared with the room layer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use matchroom_session::{Session, SessionError, SessionRef};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::TransportError;

/// Counter for generating unique session ids across the process.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Outbound queue depth per session. A client that falls further behind
/// than this starts losing messages ([`SessionError::Backpressure`]).
pub const SEND_BUFFER: usize = 256;

/// Receives connection lifecycle events and inbound frames.
///
/// Methods are called from the connection's reader task and must not
/// block; anything long-running belongs on a spawned task or behind a
/// mailbox.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// A client completed the WebSocket handshake.
    fn on_connect(&self, _session: &SessionRef) {}

    /// A data frame arrived from the client.
    fn on_message(&self, session: &SessionRef, data: Vec<u8>);

    /// The connection ended (client close, read error, or server kick).
    fn on_close(&self, _session: &SessionRef) {}
}

/// A WebSocket server bound to a local address.
pub struct WsServer {
    listener: TcpListener,
}

impl WsServer {
    /// Binds the listen socket.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
        tracing::info!(addr, "websocket server listening");
        Ok(Self { listener })
    }

    /// The actual bound address (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::LocalAddr)
    }

    /// Runs the accept loop forever, spawning one task per connection.
    ///
    /// Accept errors are logged and the loop keeps serving; only process
    /// teardown stops it.
    pub async fn run<H: ConnectionHandler>(self, handler: Arc<H>) -> Result<(), TransportError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(handle_connection(stream, peer, handler));
                }
                Err(error) => {
                    tracing::error!(%error, "accept failed");
                }
            }
        }
    }
}

/// Drives one connection from handshake to close.
async fn handle_connection<H: ConnectionHandler>(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<H>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(error) => {
            tracing::debug!(%peer, %error, "websocket handshake failed");
            return;
        }
    };

    let (sink, mut frames) = ws.split();
    let (outbound_tx, outbound_rx) = mpsc::channel(SEND_BUFFER);
    let (close_tx, close_rx) = oneshot::channel();
    let session = Arc::new(WsSession::new(outbound_tx, close_tx));
    let session_ref: SessionRef = Arc::clone(&session) as SessionRef;

    tokio::spawn(write_pump(sink, outbound_rx, close_rx));

    tracing::debug!(session = session.id(), %peer, "session connected");
    handler.on_connect(&session_ref);

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Binary(data)) => handler.on_message(&session_ref, data.into()),
            Ok(Message::Text(text)) => {
                handler.on_message(&session_ref, text.as_bytes().to_vec());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping/pong are answered by tungstenite itself
            Err(error) => {
                tracing::debug!(session = session.id(), %error, "read failed");
                break;
            }
        }
    }

    session.close();
    handler.on_close(&session_ref);
    tracing::debug!(session = session.id(), uid = session.user_id(), "session closed");
}

/// Flushes the outbound queue to the socket until the session closes.
async fn write_pump(
    mut sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    mut close: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut close => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            queued = outbound.recv() => match queued {
                Some(data) => {
                    if sink.send(Message::Binary(data.into())).await.is_err() {
                        break;
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }
}

/// The [`Session`] handed to the room layer for one WebSocket client.
pub struct WsSession {
    id: String,
    uid: AtomicI64,
    outbound: mpsc::Sender<Vec<u8>>,
    closed: AtomicBool,
    close_signal: Mutex<Option<oneshot::Sender<()>>>,
}

impl WsSession {
    fn new(outbound: mpsc::Sender<Vec<u8>>, close_signal: oneshot::Sender<()>) -> Self {
        Self {
            id: format!("conn-{}", NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)),
            uid: AtomicI64::new(0),
            outbound,
            closed: AtomicBool::new(false),
            close_signal: Mutex::new(Some(close_signal)),
        }
    }
}

impl Session for WsSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> i64 {
        self.uid.load(Ordering::SeqCst)
    }

    fn set_user_id(&self, uid: i64) {
        self.uid.store(uid, Ordering::SeqCst);
    }

    fn send(&self, msg: &[u8]) -> Result<(), SessionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        self.outbound.try_send(msg.to_vec()).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SessionError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(signal) = self.close_signal.lock().take() {
            let _ = signal.send(());
        }
    }
}
