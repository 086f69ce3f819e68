//! The transport seam and its tokio-tungstenite implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use parley_core::logging::targets;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as TungsteniteCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::message::{CloseCode, CloseInfo, CloseReason, SocketEvent, SocketId, TransportEvent};
use crate::error::{NetworkError, Result};

/// Type alias for a connected WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Opens sockets and moves frames for the connection manager.
///
/// Implementations report everything that happens on a socket as a
/// [`TransportEvent`] through whatever channel they were built with. `open`
/// only starts the attempt; the outcome arrives later as `Opened` or as
/// `Error` followed by `Closed`.
pub trait Transport {
    /// Start connecting to `url`. Returns the new socket's identity.
    fn open(&mut self, url: &Url) -> Result<SocketId>;

    /// Queue a text frame on an open socket.
    fn send_text(&mut self, socket: SocketId, text: String) -> Result<()>;

    /// Start the closing handshake. Unknown or finished sockets are ignored.
    fn close(&mut self, socket: SocketId, reason: CloseReason);
}

/// Configuration for [`WsTransport`].
#[derive(Clone, Debug)]
pub struct WsTransportConfig {
    /// Custom headers to send during the handshake.
    pub headers: HashMap<String, String>,
    /// How long to wait for the peer's close frame after sending ours.
    pub close_timeout: Duration,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            close_timeout: Duration::from_secs(5),
        }
    }
}

impl WsTransportConfig {
    /// Create a configuration with no extra headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom header for the WebSocket handshake.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set how long a client-initiated close waits for the server's reply.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

/// Command sent to a socket task.
enum Command {
    SendText(String),
    Close(CloseReason),
}

/// Sends events for one socket.
#[derive(Clone)]
struct EventEmitter {
    socket: SocketId,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventEmitter {
    fn emit(&self, event: SocketEvent) {
        // The receiver going away just means nobody is listening any more.
        let _ = self.tx.send(TransportEvent::new(self.socket, event));
    }
}

/// A WebSocket transport backed by tokio-tungstenite.
///
/// Every opened socket runs in its own tokio task. Events from all sockets
/// are delivered, tagged with their [`SocketId`], on the receiver returned
/// by [`WsTransport::new`]. `open` must be called from within a tokio
/// runtime.
pub struct WsTransport {
    config: WsTransportConfig,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    sockets: Arc<Mutex<HashMap<SocketId, mpsc::UnboundedSender<Command>>>>,
    next_id: u64,
}

impl WsTransport {
    /// Create a transport and the receiver its events arrive on.
    pub fn new(config: WsTransportConfig) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = Self {
            config,
            events_tx,
            sockets: Arc::new(Mutex::new(HashMap::new())),
            next_id: 0,
        };
        (transport, events_rx)
    }

    /// Number of sockets whose task is still running.
    pub fn live_sockets(&self) -> usize {
        self.sockets.lock().len()
    }

    /// Build the WebSocket request with custom headers.
    fn build_request(url: &Url, config: &WsTransportConfig) -> Result<Request> {
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| NetworkError::WebSocket(e.to_string()))?;

        let headers = request.headers_mut();
        for (name, value) in &config.headers {
            let header_name = http::header::HeaderName::try_from(name.as_str())?;
            let header_value = http::header::HeaderValue::try_from(value.as_str())?;
            headers.insert(header_name, header_value);
        }

        Ok(request)
    }

    /// Convert our CloseCode to tungstenite's CloseCode.
    fn to_tungstenite_close_code(code: CloseCode) -> TungsteniteCloseCode {
        match code {
            CloseCode::Normal => TungsteniteCloseCode::Normal,
            CloseCode::Away => TungsteniteCloseCode::Away,
            CloseCode::Protocol => TungsteniteCloseCode::Protocol,
            CloseCode::Unsupported => TungsteniteCloseCode::Unsupported,
            CloseCode::NoStatus => TungsteniteCloseCode::Status,
            CloseCode::Abnormal => TungsteniteCloseCode::Abnormal,
            CloseCode::Invalid => TungsteniteCloseCode::Invalid,
            CloseCode::Policy => TungsteniteCloseCode::Policy,
            CloseCode::TooBig => TungsteniteCloseCode::Size,
            CloseCode::Extension => TungsteniteCloseCode::Extension,
            CloseCode::Error => TungsteniteCloseCode::Error,
            CloseCode::Restart => TungsteniteCloseCode::Restart,
            CloseCode::Again => TungsteniteCloseCode::Again,
            CloseCode::Custom(code) => TungsteniteCloseCode::from(code),
        }
    }

    fn close_info_from_frame(frame: Option<CloseFrame>) -> CloseInfo {
        match frame {
            Some(frame) => CloseInfo::clean(
                CloseCode::from_u16(u16::from(frame.code)),
                frame.reason.to_string(),
            ),
            None => CloseInfo::clean(CloseCode::NoStatus, ""),
        }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, url: &Url) -> Result<SocketId> {
        let request = Self::build_request(url, &self.config)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| NetworkError::Connection(e.to_string()))?;

        self.next_id += 1;
        let socket = SocketId::new(self.next_id);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        self.sockets.lock().insert(socket, command_tx);

        let emitter = EventEmitter {
            socket,
            tx: self.events_tx.clone(),
        };
        let sockets = self.sockets.clone();
        let close_timeout = self.config.close_timeout;

        tracing::debug!(target: targets::TRANSPORT, %socket, %url, "opening socket");
        runtime.spawn(async move {
            let info = run_socket(request, command_rx, &emitter, close_timeout).await;
            sockets.lock().remove(&socket);
            tracing::debug!(
                target: targets::TRANSPORT,
                %socket,
                code = info.code.as_u16(),
                clean = info.was_clean,
                "socket closed"
            );
            emitter.emit(SocketEvent::Closed(info));
        });

        Ok(socket)
    }

    fn send_text(&mut self, socket: SocketId, text: String) -> Result<()> {
        let sockets = self.sockets.lock();
        match sockets.get(&socket) {
            Some(tx) => tx
                .send(Command::SendText(text))
                .map_err(|_| NetworkError::Connection("Not connected".into())),
            None => Err(NetworkError::Connection("Not connected".into())),
        }
    }

    fn close(&mut self, socket: SocketId, reason: CloseReason) {
        if let Some(tx) = self.sockets.lock().get(&socket) {
            let _ = tx.send(Command::Close(reason));
        }
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("live_sockets", &self.live_sockets())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Drive one socket from handshake to close and report how it ended.
async fn run_socket(
    request: Request,
    mut commands: mpsc::UnboundedReceiver<Command>,
    emitter: &EventEmitter,
    close_timeout: Duration,
) -> CloseInfo {
    let ws_stream = match tokio_tungstenite::connect_async(request).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            tracing::warn!(
                target: targets::TRANSPORT,
                socket = %emitter.socket,
                error = %e,
                "handshake failed"
            );
            emitter.emit(SocketEvent::Error(e.to_string()));
            return CloseInfo::abnormal();
        }
    };
    emitter.emit(SocketEvent::Opened);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(Command::SendText(text)) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            emitter.emit(SocketEvent::Error(e.to_string()));
                            return CloseInfo::abnormal();
                        }
                    }
                    Some(Command::Close(reason)) => {
                        return close_handshake(&mut write, &mut read, reason, close_timeout).await;
                    }
                    None => {
                        // Transport dropped.
                        let reason = CloseReason::new(CloseCode::Away);
                        return close_handshake(&mut write, &mut read, reason, close_timeout).await;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        emitter.emit(SocketEvent::Message(text.to_string()));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        emitter.emit(SocketEvent::Message(text));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        // Flush tungstenite's reply so the handshake completes.
                        let _ = write.close().await;
                        return WsTransport::close_info_from_frame(frame);
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are answered by tungstenite.
                    }
                    Some(Err(e)) => {
                        emitter.emit(SocketEvent::Error(e.to_string()));
                        return CloseInfo::abnormal();
                    }
                    None => {
                        return CloseInfo::abnormal();
                    }
                }
            }
        }
    }
}

/// Send our close frame and wait for the peer's.
async fn close_handshake(
    write: &mut WsSink,
    read: &mut WsSource,
    reason: CloseReason,
    timeout: Duration,
) -> CloseInfo {
    let frame = CloseFrame {
        code: WsTransport::to_tungstenite_close_code(reason.code),
        reason: reason.reason.unwrap_or_default().into(),
    };
    if write.send(Message::Close(Some(frame))).await.is_err() {
        return CloseInfo::abnormal();
    }

    let reply = tokio::time::timeout(timeout, async {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Close(frame)) => return Some(frame),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
        None
    })
    .await;

    match reply {
        Ok(Some(frame)) => WsTransport::close_info_from_frame(frame),
        _ => CloseInfo::abnormal(),
    }
}
