//! Parley - a terminal client for conversational servers over WebSocket.
//!
//! This is the umbrella crate: it re-exports the core and networking crates
//! and adds what the `parley` binary is built from, namely layered
//! [`settings`], the tokio [`client`] loop, and a line-oriented [`terminal`]
//! front end.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use parley::client::run_client;
//! use parley::settings::ClientSettings;
//! use parley::terminal::TerminalDisplay;
//! use parley::{ConnectionManager, TimerManager, WsTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ClientSettings::default();
//!     let (transport, mut events) = WsTransport::new(settings.transport_config());
//!     let mut manager =
//!         ConnectionManager::new(settings.session_config(), transport, TimerManager::new());
//!     manager.bind_display(Arc::new(Mutex::new(TerminalDisplay::new(std::io::stdout()))));
//!
//!     let (_commands_tx, mut commands) = tokio::sync::mpsc::unbounded_channel();
//!     manager.connect("abc123", false)?;
//!     run_client(&mut manager, &mut events, &mut commands).await;
//!     Ok(())
//! }
//! ```

pub use parley_core::*;
pub use parley_net::{
    ClientMessage, CloseCode, CloseInfo, CloseReason, ConnectionManager, ConnectionState,
    ControlState, ControlSurface, DisplayLine, DisplaySink, MessageCategory, NetworkError,
    ServerMessage, SessionConfig, SessionError, SocketEvent, SocketId, Transport, TransportEvent,
    WsTransport, WsTransportConfig,
};

/// Networking module.
pub mod net {
    pub use parley_net::*;
}

pub mod client;
pub mod command;
pub mod settings;
pub mod terminal;
