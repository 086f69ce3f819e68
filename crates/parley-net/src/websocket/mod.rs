//! WebSocket transport with event-based lifecycle reporting.
//!
//! This module provides:
//! - The [`Transport`] trait, the seam the connection manager drives
//! - [`WsTransport`], a tokio-tungstenite implementation (ws:// and wss://)
//! - Close codes and the [`TransportEvent`] stream every transport produces
//!
//! Transports do not reconnect on their own. Each `open` produces a fresh
//! socket with a fresh [`SocketId`]; deciding whether to open another one is
//! the connection manager's job.
//!
//! # Example
//!
//! ```ignore
//! use parley_net::websocket::{Transport, WsTransport, WsTransportConfig, SocketEvent};
//!
//! let (mut transport, mut events) = WsTransport::new(
//!     WsTransportConfig::new().header("Authorization", "Bearer token"),
//! );
//!
//! let socket = transport.open(&"ws://localhost:8000/ws/abc123".parse()?)?;
//!
//! while let Some(event) = events.recv().await {
//!     match event.event {
//!         SocketEvent::Opened => transport.send_text(socket, "{\"content\":\"hi\"}".into())?,
//!         SocketEvent::Message(text) => println!("{}", text),
//!         SocketEvent::Error(err) => eprintln!("{}", err),
//!         SocketEvent::Closed(info) => break,
//!     }
//! }
//! ```

mod message;
mod transport;

pub use message::{CloseCode, CloseInfo, CloseReason, SocketEvent, SocketId, TransportEvent};
pub use transport::{Transport, WsTransport, WsTransportConfig};
