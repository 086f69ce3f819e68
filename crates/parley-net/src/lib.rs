//! Networking module for Parley.
//!
//! This crate connects a chat client to a conversational server over
//! WebSocket and keeps that connection alive:
//!
//! - **WebSocket transport**: [`WsTransport`] opens sockets and reports their
//!   lifecycle as [`TransportEvent`]s tagged with a [`SocketId`]
//! - **Connection manager**: [`ConnectionManager`] is the lifecycle state
//!   machine. It renders server messages, reconnects after abnormal closes
//!   with bounded exponential backoff, and stops for good once the server
//!   declares the session completed
//! - **Protocol**: [`ServerMessage`] and [`ClientMessage`] describe the JSON
//!   frames exchanged with the server
//!
//! # Example
//!
//! ```ignore
//! use parley_core::TimerManager;
//! use parley_net::{ConnectionManager, SessionConfig, WsTransport, WsTransportConfig};
//!
//! let (transport, mut events) = WsTransport::new(WsTransportConfig::default());
//! let mut manager = ConnectionManager::new(
//!     SessionConfig::new("ws://localhost:8000/ws"),
//!     transport,
//!     TimerManager::new(),
//! );
//!
//! manager.line_rendered.connect(|line| println!("[{}] {}", line.category, line.text));
//! manager.connect("abc123", false)?;
//!
//! while let Some(event) = events.recv().await {
//!     manager.handle_event(event);
//! }
//! ```
//!
//! The manager never blocks and never spawns: the owner feeds it transport
//! events and expired timers, which is what makes the state machine testable
//! with a fake transport and a [`ManualClock`](parley_core::ManualClock).

mod error;
pub mod session;
pub mod websocket;

pub use error::{NetworkError, Result, SessionError};

pub use session::{
    ClientMessage, ConnectionManager, ConnectionState, ControlState, ControlSurface, DisplayLine,
    DisplaySink, FrameText, HistoryEntry, MessageCategory, ServerMessage, SessionConfig,
    UiBinding,
};
pub use websocket::{
    CloseCode, CloseInfo, CloseReason, SocketEvent, SocketId, Transport, TransportEvent,
    WsTransport, WsTransportConfig,
};
