//! The connection lifecycle state machine.

use std::time::Duration;

use parley_core::logging::targets;
use parley_core::{Scheduler, Signal, TimerId};
use tracing::{debug, info, trace, warn};

use super::config::SessionConfig;
use super::display::{ControlState, DisplayLine, MessageCategory};
use super::protocol::{ClientMessage, FrameText, ServerMessage};
use super::state::{ConnectionState, SocketState};
use crate::error::{NetworkError, SessionError};
use crate::websocket::{
    CloseCode, CloseInfo, CloseReason, SocketEvent, SocketId, Transport, TransportEvent,
};

/// Close reason sent when the user disconnects.
const USER_DISCONNECT_REASON: &str = "User initiated disconnect";

/// The socket the manager currently holds.
#[derive(Clone, Copy, Debug)]
struct ActiveSocket {
    id: SocketId,
    state: SocketState,
    is_reconnect: bool,
}

/// Keeps one conversation session alive over a [`Transport`].
///
/// The manager owns at most one socket and at most one pending reconnect
/// timer. It never blocks: socket outcomes arrive later through
/// [`handle_event`](Self::handle_event), and expired timers through
/// [`handle_timer`](Self::handle_timer) or [`poll_timers`](Self::poll_timers).
/// Events carrying a [`SocketId`] other than the current one are ignored, so
/// a replaced or user-closed socket can never disturb the live session.
///
/// After an abnormal close the manager schedules a reconnection with bounded
/// exponential backoff (see [`SessionConfig::delay_for_attempt`]). Once the
/// server declares the session completed, no close ever triggers a
/// reconnection and sending is refused until a fresh manual connect.
///
/// # Signals
///
/// - [`line_rendered`](Self::line_rendered): a line to append to the display
/// - [`display_cleared`](Self::display_cleared): a fresh session started
/// - [`controls_changed`](Self::controls_changed): controls to enable/disable
/// - [`input_cleared`](Self::input_cleared): a message was sent
/// - [`state_changed`](Self::state_changed): the observable state changed
pub struct ConnectionManager<T: Transport, S: Scheduler> {
    config: SessionConfig,
    transport: T,
    scheduler: S,
    socket: Option<ActiveSocket>,
    conversation_id: Option<String>,
    reconnect_attempts: u32,
    reconnect_timer: Option<TimerId>,
    session_completed: bool,
    state: ConnectionState,

    /// Signal emitted for every line to render.
    pub line_rendered: Signal<DisplayLine>,
    /// Signal emitted when the display should be emptied.
    pub display_cleared: Signal<()>,
    /// Signal emitted when the controls should change.
    pub controls_changed: Signal<ControlState>,
    /// Signal emitted after a message was sent.
    pub input_cleared: Signal<()>,
    /// Signal emitted when the observable state changes.
    pub state_changed: Signal<ConnectionState>,
}

impl<T: Transport, S: Scheduler> ConnectionManager<T, S> {
    /// Create a manager. Nothing is opened until [`connect`](Self::connect).
    pub fn new(config: SessionConfig, transport: T, scheduler: S) -> Self {
        Self {
            config,
            transport,
            scheduler,
            socket: None,
            conversation_id: None,
            reconnect_attempts: 0,
            reconnect_timer: None,
            session_completed: false,
            state: ConnectionState::Disconnected,
            line_rendered: Signal::new(),
            display_cleared: Signal::new(),
            controls_changed: Signal::new(),
            input_cleared: Signal::new(),
            state_changed: Signal::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Current observable state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnections scheduled since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Whether the server declared the session completed.
    pub fn is_session_completed(&self) -> bool {
        self.session_completed
    }

    /// The conversation of the current or last session.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// The socket currently held, if any.
    pub fn current_socket(&self) -> Option<SocketId> {
        self.socket.map(|socket| socket.id)
    }

    /// Whether the held socket is open.
    pub fn is_open(&self) -> bool {
        self.socket
            .is_some_and(|socket| socket.state == SocketState::Open)
    }

    /// The pending reconnect timer, if any.
    pub fn pending_reconnect(&self) -> Option<TimerId> {
        self.reconnect_timer
    }

    /// Open a socket for `conversation_id`.
    ///
    /// A manual connect (`is_reconnect == false`) clears the display and
    /// starts a clean session: the completed flag and the retry counter are
    /// reset. Any pending reconnect timer is cancelled and any held socket is
    /// closed and forgotten before the new one is opened.
    ///
    /// Returns once the open has been requested; the outcome arrives as a
    /// transport event.
    pub fn connect(
        &mut self,
        conversation_id: &str,
        is_reconnect: bool,
    ) -> Result<(), SessionError> {
        let conversation_id = conversation_id.trim();
        if conversation_id.is_empty() {
            self.render_error("Please enter a conversation ID");
            return Err(SessionError::MissingConversationId);
        }

        let url = match self.config.endpoint(conversation_id, is_reconnect) {
            Ok(url) => url,
            Err(err) => {
                self.render_error(format!("Invalid server address: {err}"));
                return Err(err.into());
            }
        };

        if !is_reconnect {
            self.display_cleared.emit(());
            self.session_completed = false;
            self.reconnect_attempts = 0;
        }

        self.cancel_reconnect_timer();
        self.release_socket(CloseReason::normal());
        self.conversation_id = Some(conversation_id.to_string());

        info!(target: targets::SESSION, %url, is_reconnect, "opening connection");
        match self.transport.open(&url) {
            Ok(id) => {
                self.socket = Some(ActiveSocket {
                    id,
                    state: SocketState::Connecting,
                    is_reconnect,
                });
                self.set_state(ConnectionState::Connecting);
                Ok(())
            }
            Err(err) => {
                warn!(target: targets::SESSION, error = %err, "failed to open socket");
                self.render_error("WebSocket error occurred");
                self.on_closed(CloseInfo::abnormal());
                Err(err.into())
            }
        }
    }

    /// Close the session at the user's request.
    ///
    /// Closes the held socket with code 1000 and cancels any pending
    /// reconnection. Does nothing when there is neither a socket nor a
    /// pending reconnection.
    pub fn disconnect(&mut self) {
        let had_timer = self.cancel_reconnect_timer();
        let socket = self.socket.take();
        if socket.is_none() && !had_timer {
            trace!(target: targets::SESSION, "disconnect ignored, nothing to close");
            return;
        }

        if let Some(socket) = socket {
            info!(target: targets::SESSION, socket = %socket.id, "closing at user request");
            self.transport.close(
                socket.id,
                CloseReason::with_reason(CloseCode::Normal, USER_DISCONNECT_REASON),
            );
        }

        self.render_system("Disconnected from server");
        self.controls_changed.emit(ControlState::disconnected());
        self.set_state(self.resting_state());
    }

    /// Send a chat message.
    ///
    /// Refused when `payload` is empty, when the session is completed, or
    /// when no socket is open. Each refusal is also rendered as an error.
    pub fn send(&mut self, payload: &str) -> Result<(), SessionError> {
        if payload.is_empty() {
            self.render_error("Please enter a message");
            return Err(SessionError::EmptyMessage);
        }

        if self.session_completed {
            self.render_error("Survey completed; sending is disabled");
            return Err(SessionError::SessionCompleted);
        }

        let socket = match self.socket {
            Some(socket) if socket.state == SocketState::Open => socket.id,
            _ => {
                self.render_error("Not connected to server");
                return Err(SessionError::NotConnected);
            }
        };

        if let Err(err) = self.transmit(socket, &ClientMessage::chat(payload)) {
            warn!(target: targets::SESSION, error = %err, "failed to send message");
            self.render_error(format!("Failed to send message: {err}"));
            return Err(err.into());
        }

        self.line_rendered
            .emit(DisplayLine::new(format!("USER: {payload}"), MessageCategory::User));
        self.input_cleared.emit(());
        Ok(())
    }

    /// Feed one transport event. Events for sockets other than the current
    /// one are dropped.
    pub fn handle_event(&mut self, event: TransportEvent) {
        if self.current_socket() != Some(event.socket) {
            trace!(
                target: targets::SESSION,
                socket = %event.socket,
                "ignoring event from stale socket"
            );
            return;
        }

        match event.event {
            SocketEvent::Opened => self.on_opened(),
            SocketEvent::Message(text) => self.on_message(&text),
            SocketEvent::Error(err) => {
                warn!(
                    target: targets::SESSION,
                    socket = %event.socket,
                    error = %err,
                    "transport error"
                );
                self.render_error("WebSocket error occurred");
            }
            SocketEvent::Closed(info) => {
                self.socket = None;
                self.on_closed(info);
            }
        }
    }

    /// Feed one expired timer. Only the pending reconnect timer has an effect.
    pub fn handle_timer(&mut self, id: TimerId) {
        if self.reconnect_timer != Some(id) {
            trace!(target: targets::SESSION, ?id, "ignoring unknown timer");
            return;
        }
        self.reconnect_timer = None;

        let Some(conversation_id) = self.conversation_id.clone() else {
            return;
        };

        self.render_system("Reconnecting...");
        if let Err(err) = self.connect(&conversation_id, true) {
            debug!(target: targets::SESSION, error = %err, "reconnection did not start");
        }
    }

    /// Take every expired timer from the scheduler and handle it.
    pub fn poll_timers(&mut self) {
        for id in self.scheduler.take_expired() {
            self.handle_timer(id);
        }
    }

    /// Time until the scheduler's next deadline, for the owner's event loop.
    pub fn time_until_next_timer(&mut self) -> Option<Duration> {
        self.scheduler.time_until_next()
    }

    fn on_opened(&mut self) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        socket.state = SocketState::Open;
        let ActiveSocket { id, is_reconnect, .. } = *socket;

        info!(target: targets::SESSION, socket = %id, is_reconnect, "connection open");
        self.reconnect_attempts = 0;
        self.render_system("Connected to server");
        self.controls_changed
            .emit(ControlState::connected(self.session_completed));
        self.set_state(ConnectionState::Open);

        if is_reconnect
            && let Err(err) = self.transmit(id, &ClientMessage::reconnect_confirm())
        {
            warn!(target: targets::SESSION, error = %err, "failed to confirm reconnection");
        }
    }

    fn on_message(&mut self, raw: &str) {
        let message = match ServerMessage::parse(raw) {
            Ok(message) => message,
            Err(err) => {
                debug!(target: targets::SESSION, error = %err, "undecodable frame");
                self.render_error(format!("Failed to parse message: {raw}"));
                return;
            }
        };

        match message {
            ServerMessage::Error { message } => self.render_error(format!("Error: {message}")),
            ServerMessage::State => {
                debug!(target: targets::SESSION, payload = raw, "initial state");
                self.render_system("Received initial state");
            }
            ServerMessage::History { messages } => {
                self.render_system("Received message history");
                match messages {
                    Some(entries) if !entries.is_empty() => {
                        for entry in entries {
                            self.render_from(&entry.sender, &entry.content);
                        }
                    }
                    _ => self.render_system("No message history"),
                }
            }
            ServerMessage::Message { sender, content } => self.render_from(&sender, &content),
            ServerMessage::Resumed { message } => {
                self.render_system(format!("Resumed conversation: {message}"));
            }
            ServerMessage::Completed {
                message,
                close_connection,
                close_reason,
            } => {
                info!(target: targets::SESSION, "session completed");
                self.render_system(format!("Survey completed: {message}"));
                self.session_completed = true;
                self.controls_changed.emit(ControlState::connected(true));
                self.set_state(ConnectionState::Completed);

                if close_connection {
                    self.render_system(format!("Connection will close: {close_reason}"));
                }
            }
            ServerMessage::ReconnectSuccess { message } => {
                self.render_system(format!("Reconnection successful: {message}"));
            }
            ServerMessage::Unrecognized(value) => self.render_system(format!("Received: {value}")),
        }
    }

    fn on_closed(&mut self, info: CloseInfo) {
        info!(
            target: targets::SESSION,
            code = info.code.as_u16(),
            reason = %info.reason,
            was_clean = info.was_clean,
            "connection closed"
        );
        self.controls_changed.emit(ControlState::disconnected());

        if self.session_completed {
            self.render_system("Connection closed: Survey completed");
            self.set_state(ConnectionState::Completed);
            return;
        }

        if info.was_clean {
            self.render_system(format!(
                "Connection closed cleanly, code={}, reason={}",
                info.code, info.reason
            ));
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        self.render_error("Connection died");
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        let max_attempts = self.config.max_reconnect_attempts;
        if self.reconnect_attempts >= max_attempts {
            warn!(target: targets::SESSION, max_attempts, "giving up on reconnection");
            self.render_error(format!("Failed to reconnect after {max_attempts} attempts"));
            self.set_state(ConnectionState::Disconnected);
            return;
        }

        self.reconnect_attempts += 1;
        let delay = self.config.delay_for_attempt(self.reconnect_attempts);
        warn!(
            target: targets::SESSION,
            attempt = self.reconnect_attempts,
            max_attempts,
            ?delay,
            "scheduling reconnection"
        );
        self.render_system(format!(
            "Attempting to reconnect in {} seconds (attempt {}/{})...",
            delay.as_secs_f64(),
            self.reconnect_attempts,
            max_attempts
        ));

        self.cancel_reconnect_timer();
        self.reconnect_timer = Some(self.scheduler.schedule(delay));
        self.set_state(ConnectionState::AwaitingRetry);
    }

    /// Returns whether a timer was pending.
    fn cancel_reconnect_timer(&mut self) -> bool {
        match self.reconnect_timer.take() {
            Some(id) => {
                self.scheduler.cancel(id);
                true
            }
            None => false,
        }
    }

    fn release_socket(&mut self, reason: CloseReason) {
        if let Some(socket) = self.socket.take() {
            debug!(target: targets::SESSION, socket = %socket.id, "releasing superseded socket");
            self.transport.close(socket.id, reason);
        }
    }

    fn transmit(&mut self, socket: SocketId, message: &ClientMessage) -> Result<(), NetworkError> {
        let text = message.to_json()?;
        self.transport.send_text(socket, text)
    }

    fn resting_state(&self) -> ConnectionState {
        if self.session_completed {
            ConnectionState::Completed
        } else {
            ConnectionState::Disconnected
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!(target: targets::SESSION, from = %self.state, to = %state, "state transition");
        self.state = state;
        self.state_changed.emit(state);
    }

    fn render_system(&self, text: impl Into<String>) {
        self.line_rendered
            .emit(DisplayLine::new(text, MessageCategory::System));
    }

    fn render_error(&self, text: impl Into<String>) {
        self.line_rendered
            .emit(DisplayLine::new(text, MessageCategory::Error));
    }

    fn render_from(&self, sender: &str, content: &FrameText) {
        self.line_rendered.emit(DisplayLine::new(
            format!("{sender}: {content}"),
            MessageCategory::from_sender(sender),
        ));
    }
}

impl<T: Transport, S: Scheduler> std::fmt::Debug for ConnectionManager<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .field("socket", &self.socket)
            .field("conversation_id", &self.conversation_id)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("reconnect_timer", &self.reconnect_timer)
            .field("session_completed", &self.session_completed)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
