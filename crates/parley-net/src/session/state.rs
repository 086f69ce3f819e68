//! State enums for the connection manager.

/// Observable state of a [`ConnectionManager`](super::ConnectionManager).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no pending retry.
    #[default]
    Disconnected,
    /// A socket has been requested and has not opened yet.
    Connecting,
    /// Connected and ready to send/receive messages.
    Open,
    /// Connection died; a reconnection is scheduled.
    AwaitingRetry,
    /// The server declared the session completed. Only a fresh manual
    /// connect leaves this state.
    Completed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::AwaitingRetry => write!(f, "AwaitingRetry"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// The manager's view of the socket it currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketState {
    /// Opening handshake in progress.
    Connecting,
    /// Ready to send/receive.
    Open,
}

impl std::fmt::Display for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
        }
    }
}
