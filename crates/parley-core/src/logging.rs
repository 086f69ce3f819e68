//! Tracing integration for Parley.
//!
//! Parley uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber, for example:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives (`RUST_LOG=parley_net::session=debug`)
/// to filter logs by subsystem.
pub mod targets {
    /// Timer system target.
    pub const TIMER: &str = "parley_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "parley_core::signal";
    /// WebSocket transport target.
    pub const TRANSPORT: &str = "parley_net::transport";
    /// Connection lifecycle target.
    pub const SESSION: &str = "parley_net::session";
    /// Client event loop target.
    pub const CLIENT: &str = "parley::client";
}
