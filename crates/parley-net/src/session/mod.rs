//! Conversation sessions over a [`Transport`](crate::websocket::Transport).
//!
//! [`ConnectionManager`] decides when a connection is alive, when it may be
//! re-established, and when the server has ended the session for good. What
//! it has to say goes out through signals; [`DisplaySink`] and
//! [`ControlSurface`] describe the collaborators that usually listen.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --connect--> Connecting --opened--> Open
//! Open --clean close / disconnect--> Disconnected
//! Open --abnormal close--> AwaitingRetry --timer--> Connecting
//! Open --"completed" frame--> Completed
//! ```
//!
//! `Completed` is left only by a fresh manual connect.

mod config;
mod display;
mod manager;
mod protocol;
mod state;

pub use config::{DEFAULT_BASE_URL, SessionConfig};
pub use display::{
    ControlState, ControlSurface, DisplayLine, DisplaySink, MessageCategory, UiBinding,
};
pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ControlMessage, FrameText, HistoryEntry, ServerMessage};
pub use state::{ConnectionState, SocketState};
