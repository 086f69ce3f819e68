//! Tests for the connection lifecycle state machine.
//!
//! The manager is driven with a recording fake transport and a manual clock,
//! so every socket outcome and every retry deadline is under test control.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use parley_core::{Clock, ManualClock, TimerManager};
use parley_net::websocket::{
    CloseCode, CloseInfo, CloseReason, SocketEvent, SocketId, Transport, TransportEvent,
};
use parley_net::{
    ConnectionManager, ConnectionState, ControlState, ControlSurface, DisplayLine, DisplaySink,
    MessageCategory, NetworkError, SessionConfig, SessionError,
};
use url::Url;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Open(String),
    Send(SocketId, String),
    Close(SocketId, CloseReason),
}

#[derive(Debug, Default)]
struct FakeTransport {
    calls: Vec<Call>,
    next_id: u64,
    fail_open: bool,
    fail_send: bool,
}

impl FakeTransport {
    fn opens(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Open(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    fn sent(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Send(_, text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Transport for FakeTransport {
    fn open(&mut self, url: &Url) -> Result<SocketId, NetworkError> {
        if self.fail_open {
            return Err(NetworkError::Connection("no runtime".into()));
        }
        self.next_id += 1;
        self.calls.push(Call::Open(url.to_string()));
        Ok(SocketId::new(self.next_id))
    }

    fn send_text(&mut self, socket: SocketId, text: String) -> Result<(), NetworkError> {
        if self.fail_send {
            return Err(NetworkError::Connection("socket gone".into()));
        }
        self.calls.push(Call::Send(socket, text));
        Ok(())
    }

    fn close(&mut self, socket: SocketId, reason: CloseReason) {
        self.calls.push(Call::Close(socket, reason));
    }
}

#[derive(Default)]
struct RecordingDisplay {
    lines: Vec<DisplayLine>,
    clears: usize,
}

impl DisplaySink for RecordingDisplay {
    fn render(&mut self, line: &DisplayLine) {
        self.lines.push(line.clone());
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.clears += 1;
    }
}

#[derive(Default)]
struct RecordingControls {
    states: Vec<ControlState>,
    input_clears: usize,
}

impl ControlSurface for RecordingControls {
    fn set_controls(&mut self, state: ControlState) {
        self.states.push(state);
    }

    fn clear_input(&mut self) {
        self.input_clears += 1;
    }
}

type Manager = ConnectionManager<FakeTransport, TimerManager<ManualClock>>;

struct Harness {
    manager: Manager,
    clock: ManualClock,
    display: Arc<Mutex<RecordingDisplay>>,
    controls: Arc<Mutex<RecordingControls>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    fn with_config(config: SessionConfig) -> Self {
        let clock = ManualClock::new();
        let manager = ConnectionManager::new(
            config,
            FakeTransport::default(),
            TimerManager::with_clock(clock.clone()),
        );
        let display = Arc::new(Mutex::new(RecordingDisplay::default()));
        let controls = Arc::new(Mutex::new(RecordingControls::default()));
        manager.bind_display(display.clone());
        manager.bind_controls(controls.clone());

        Self {
            manager,
            clock,
            display,
            controls,
        }
    }

    fn connected(conversation_id: &str) -> Self {
        let mut harness = Self::new();
        harness.manager.connect(conversation_id, false).unwrap();
        harness.open();
        harness
    }

    fn socket(&self) -> SocketId {
        self.manager.current_socket().expect("no socket held")
    }

    fn event(&mut self, socket: SocketId, event: SocketEvent) {
        self.manager.handle_event(TransportEvent::new(socket, event));
    }

    fn open(&mut self) {
        let socket = self.socket();
        self.event(socket, SocketEvent::Opened);
    }

    fn receive(&mut self, json: &str) {
        let socket = self.socket();
        self.event(socket, SocketEvent::Message(json.to_string()));
    }

    fn drop_connection(&mut self) {
        let socket = self.socket();
        self.event(socket, SocketEvent::Closed(CloseInfo::abnormal()));
    }

    fn advance(&mut self, by: Duration) {
        self.clock.advance(by);
        self.manager.poll_timers();
    }

    fn texts(&self) -> Vec<String> {
        self.display
            .lock()
            .lines
            .iter()
            .map(|line| line.text.clone())
            .collect()
    }

    fn last_line(&self) -> DisplayLine {
        self.display.lock().lines.last().cloned().expect("nothing rendered")
    }

    fn last_controls(&self) -> ControlState {
        *self.controls.lock().states.last().expect("no control state applied")
    }

    fn opens(&self) -> Vec<String> {
        self.manager
            .transport()
            .opens()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn sent(&self) -> Vec<String> {
        self.manager
            .transport()
            .sent()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

fn system(text: &str) -> DisplayLine {
    DisplayLine::new(text, MessageCategory::System)
}

fn error(text: &str) -> DisplayLine {
    DisplayLine::new(text, MessageCategory::Error)
}

// ============================================================================
// Connect / open / send
// ============================================================================

#[test]
fn test_connect_open_and_send() {
    let mut h = Harness::new();

    h.manager.connect("abc123", false).unwrap();
    assert_eq!(h.opens(), vec!["ws://localhost:8000/ws/abc123"]);
    assert_eq!(h.manager.state(), ConnectionState::Connecting);

    h.open();
    assert_eq!(h.last_line(), system("Connected to server"));
    assert_eq!(h.last_controls(), ControlState::connected(false));
    assert!(h.last_controls().input_enabled);
    assert_eq!(h.manager.state(), ConnectionState::Open);
    assert!(h.manager.is_open());

    h.manager.send("hello").unwrap();
    assert_eq!(h.sent(), vec![r#"{"content":"hello"}"#]);
    assert_eq!(
        h.last_line(),
        DisplayLine::new("USER: hello", MessageCategory::User)
    );
    assert_eq!(h.controls.lock().input_clears, 1);
}

#[test]
fn test_connect_requires_conversation_id() {
    let mut h = Harness::new();

    let result = h.manager.connect("   ", false);
    assert_eq!(result, Err(SessionError::MissingConversationId));
    assert_eq!(h.last_line(), error("Please enter a conversation ID"));
    assert!(h.opens().is_empty());
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
    assert_eq!(h.display.lock().clears, 0);
}

#[test]
fn test_connect_rejects_non_websocket_base_url() {
    let mut h = Harness::with_config(SessionConfig::new("http://localhost:8000/ws"));

    let result = h.manager.connect("abc123", false);
    assert!(matches!(result, Err(SessionError::Transport(NetworkError::InvalidUrl(_)))));
    assert!(h.last_line().text.starts_with("Invalid server address:"));
    assert!(h.opens().is_empty());
}

#[test]
fn test_manual_connect_clears_display() {
    let mut h = Harness::connected("abc123");
    assert_eq!(h.display.lock().clears, 1);

    h.manager.connect("other", false).unwrap();
    assert_eq!(h.display.lock().clears, 2);
    assert!(h.texts().is_empty());
}

#[test]
fn test_send_without_open_socket_transmits_nothing() {
    let mut h = Harness::new();
    assert_eq!(h.manager.send("hello"), Err(SessionError::NotConnected));
    assert_eq!(h.last_line(), error("Not connected to server"));

    h.manager.connect("abc123", false).unwrap();
    assert_eq!(h.manager.send("hello"), Err(SessionError::NotConnected));
    assert_eq!(h.last_line(), error("Not connected to server"));

    assert!(h.sent().is_empty());
    assert_eq!(h.controls.lock().input_clears, 0);
}

#[test]
fn test_send_rejects_empty_message() {
    let mut h = Harness::connected("abc123");

    assert_eq!(h.manager.send(""), Err(SessionError::EmptyMessage));
    assert_eq!(h.last_line(), error("Please enter a message"));
    assert!(h.sent().is_empty());
}

#[test]
fn test_send_failure_is_rendered() {
    let mut h = Harness::connected("abc123");
    h.manager.transport_mut().fail_send = true;

    let result = h.manager.send("hello");
    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert!(h.last_line().text.starts_with("Failed to send message:"));
    assert_eq!(h.controls.lock().input_clears, 0);
}

// ============================================================================
// Inbound messages
// ============================================================================

#[test]
fn test_history_is_rendered_per_sender() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"history","messages":[{"sender":"BOT","content":"hi"}]}"#);

    let lines = h.display.lock().lines.clone();
    let n = lines.len();
    assert_eq!(lines[n - 2], system("Received message history"));
    assert_eq!(lines[n - 1].text, "BOT: hi");
    assert_eq!(lines[n - 1].category.as_str(), "bot");
}

#[test]
fn test_empty_or_missing_history() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"history","messages":[]}"#);
    assert_eq!(h.last_line(), system("No message history"));

    h.receive(r#"{"type":"history"}"#);
    assert_eq!(h.last_line(), system("No message history"));
}

#[test]
fn test_server_message_kinds() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"error","message":"bad input"}"#);
    assert_eq!(h.last_line(), error("Error: bad input"));

    h.receive(r#"{"type":"state","conversation":{"id":"abc123"}}"#);
    assert_eq!(h.last_line(), system("Received initial state"));

    h.receive(r#"{"type":"message","sender":"USER","content":"echo"}"#);
    assert_eq!(h.last_line(), DisplayLine::new("USER: echo", MessageCategory::User));

    h.receive(r#"{"type":"resumed","message":"welcome back"}"#);
    assert_eq!(h.last_line(), system("Resumed conversation: welcome back"));

    h.receive(r#"{"type":"reconnect_success","message":"ok"}"#);
    assert_eq!(h.last_line(), system("Reconnection successful: ok"));
}

#[test]
fn test_non_string_fields_render_as_json() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"message","sender":"BOT","content":5}"#);
    assert_eq!(
        h.last_line(),
        DisplayLine::new("BOT: 5", MessageCategory::from_sender("BOT"))
    );

    h.receive(r#"{"type":"error","message":null}"#);
    assert_eq!(h.last_line(), error("Error: null"));

    h.receive(r#"{"type":"resumed","message":{"step":2}}"#);
    assert_eq!(h.last_line(), system(r#"Resumed conversation: {"step":2}"#));

    h.receive(r#"{"type":"history","messages":[{"sender":"BOT","content":[1,2]}]}"#);
    assert_eq!(h.texts().last().map(String::as_str), Some("BOT: [1,2]"));
    assert_eq!(h.manager.state(), ConnectionState::Open);
}

#[test]
fn test_missing_display_fields_render_empty() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"reconnect_success"}"#);
    assert_eq!(h.last_line(), system("Reconnection successful: "));
}

#[test]
fn test_unrecognized_message_is_echoed() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"typing","who":"BOT"}"#);
    assert_eq!(h.last_line(), system(r#"Received: {"type":"typing","who":"BOT"}"#));
}

#[test]
fn test_parse_failure_keeps_connection_open() {
    let mut h = Harness::connected("abc123");

    h.receive("not json");
    assert_eq!(h.last_line(), error("Failed to parse message: not json"));
    assert_eq!(h.manager.state(), ConnectionState::Open);
    assert!(h.manager.is_open());

    h.manager.send("still here").unwrap();
}

// ============================================================================
// Completion
// ============================================================================

#[test]
fn test_completed_disables_input_and_reconnection() {
    let mut h = Harness::connected("abc123");

    h.receive(
        r#"{"type":"completed","message":"Thanks","close_connection":true,"close_reason":"done"}"#,
    );
    let texts = h.texts();
    assert_eq!(
        &texts[texts.len() - 2..],
        ["Survey completed: Thanks", "Connection will close: done"]
    );
    assert!(!h.last_controls().input_enabled);
    assert!(h.manager.is_session_completed());
    assert_eq!(h.manager.state(), ConnectionState::Completed);

    assert_eq!(h.manager.send("more"), Err(SessionError::SessionCompleted));
    assert_eq!(h.last_line(), error("Survey completed; sending is disabled"));

    let rendered_before = h.texts().len();
    h.drop_connection();
    assert_eq!(&h.texts()[rendered_before..], ["Connection closed: Survey completed"]);
    assert!(h.manager.pending_reconnect().is_none());
    assert_eq!(h.manager.reconnect_attempts(), 0);
    assert_eq!(h.manager.state(), ConnectionState::Completed);

    h.advance(Duration::from_secs(60));
    assert_eq!(h.opens().len(), 1);
}

#[test]
fn test_clean_close_after_completion_does_not_reconnect() {
    let mut h = Harness::connected("abc123");
    let socket = h.socket();
    h.receive(r#"{"type":"completed","message":"Thanks","close_connection":true}"#);

    let rendered_before = h.texts().len();
    h.event(
        socket,
        SocketEvent::Closed(CloseInfo::clean(CloseCode::Normal, "done")),
    );

    assert_eq!(&h.texts()[rendered_before..], ["Connection closed: Survey completed"]);
    assert!(h.manager.pending_reconnect().is_none());
    assert!(h.manager.current_socket().is_none());
    assert_eq!(h.manager.state(), ConnectionState::Completed);

    h.advance(Duration::from_secs(60));
    assert_eq!(h.opens().len(), 1);
}

#[test]
fn test_completed_without_close_flag() {
    let mut h = Harness::connected("abc123");

    h.receive(r#"{"type":"completed","message":"Thanks"}"#);
    assert_eq!(h.last_line(), system("Survey completed: Thanks"));
}

#[test]
fn test_fresh_connect_resets_completion() {
    let mut h = Harness::connected("abc123");
    h.receive(r#"{"type":"completed","message":"Thanks"}"#);
    h.manager.disconnect();
    assert!(h.manager.is_session_completed());
    assert_eq!(h.manager.state(), ConnectionState::Completed);

    h.manager.connect("abc123", false).unwrap();
    assert!(!h.manager.is_session_completed());
    h.open();
    assert!(h.last_controls().input_enabled);
    h.manager.send("again").unwrap();
}

// ============================================================================
// Close handling and reconnection
// ============================================================================

#[test]
fn test_clean_close_does_not_reconnect() {
    let mut h = Harness::connected("abc123");
    let socket = h.socket();

    h.event(
        socket,
        SocketEvent::Closed(CloseInfo::clean(CloseCode::Normal, "bye")),
    );

    assert_eq!(
        h.last_line(),
        system("Connection closed cleanly, code=1000, reason=bye")
    );
    assert_eq!(h.last_controls(), ControlState::disconnected());
    assert!(h.manager.pending_reconnect().is_none());
    assert!(h.manager.current_socket().is_none());
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
}

#[test]
fn test_abnormal_close_schedules_one_retry() {
    let mut h = Harness::connected("abc123");

    h.drop_connection();

    let texts = h.texts();
    assert_eq!(
        &texts[texts.len() - 2..],
        [
            "Connection died",
            "Attempting to reconnect in 2 seconds (attempt 1/3)..."
        ]
    );
    assert_eq!(h.manager.reconnect_attempts(), 1);
    assert_eq!(h.manager.state(), ConnectionState::AwaitingRetry);
    assert_eq!(h.manager.scheduler().active_count(), 1);

    let timer = h.manager.pending_reconnect().unwrap();
    assert_eq!(
        h.manager.scheduler().deadline(timer),
        Some(h.clock.now() + Duration::from_millis(2000))
    );
}

#[test]
fn test_retry_fires_after_delay_with_reconnect_flag() {
    let mut h = Harness::connected("abc123");
    h.drop_connection();

    h.advance(Duration::from_millis(1999));
    assert_eq!(h.opens().len(), 1);

    h.advance(Duration::from_millis(1));
    assert_eq!(
        h.opens(),
        vec![
            "ws://localhost:8000/ws/abc123",
            "ws://localhost:8000/ws/abc123?reconnect=true"
        ]
    );
    assert!(h.texts().contains(&"Reconnecting...".to_string()));
    assert_eq!(h.manager.state(), ConnectionState::Connecting);
    assert!(h.manager.pending_reconnect().is_none());
    // A reconnection keeps the transcript.
    assert_eq!(h.display.lock().clears, 1);
}

#[test]
fn test_reopen_confirms_and_resets_attempts() {
    let mut h = Harness::connected("abc123");
    h.drop_connection();
    h.advance(Duration::from_secs(2));
    assert_eq!(h.manager.reconnect_attempts(), 1);

    h.open();
    assert_eq!(h.manager.reconnect_attempts(), 0);
    assert_eq!(h.sent(), vec![r#"{"type":"reconnect_confirm"}"#]);
    assert_eq!(h.manager.state(), ConnectionState::Open);
}

#[test]
fn test_first_open_sends_no_confirmation() {
    let h = Harness::connected("abc123");
    assert!(h.sent().is_empty());
}

#[test]
fn test_backoff_doubles_then_gives_up() {
    let mut h = Harness::connected("abc123");

    for (attempt, delay_ms) in [(1, 2000), (2, 4000), (3, 8000)] {
        h.drop_connection();
        assert_eq!(h.manager.reconnect_attempts(), attempt);
        assert_eq!(
            h.last_line(),
            system(&format!(
                "Attempting to reconnect in {} seconds (attempt {attempt}/3)...",
                delay_ms / 1000
            ))
        );
        let timer = h.manager.pending_reconnect().unwrap();
        assert_eq!(
            h.manager.scheduler().deadline(timer),
            Some(h.clock.now() + Duration::from_millis(delay_ms))
        );

        h.advance(Duration::from_millis(delay_ms));
        assert_eq!(h.opens().len(), attempt as usize + 1);
    }

    h.drop_connection();
    assert_eq!(h.last_line(), error("Failed to reconnect after 3 attempts"));
    assert_eq!(h.manager.reconnect_attempts(), 3);
    assert!(h.manager.pending_reconnect().is_none());
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);

    h.advance(Duration::from_secs(60));
    assert_eq!(h.opens().len(), 4);
}

#[test]
fn test_delay_is_capped() {
    let config = SessionConfig::default()
        .max_reconnect_attempts(5)
        .max_delay(Duration::from_millis(5000));
    let mut h = Harness::with_config(config);
    h.manager.connect("abc123", false).unwrap();
    h.open();

    for delay_ms in [2000, 4000, 5000, 5000] {
        h.drop_connection();
        let timer = h.manager.pending_reconnect().unwrap();
        assert_eq!(
            h.manager.scheduler().deadline(timer),
            Some(h.clock.now() + Duration::from_millis(delay_ms))
        );
        h.advance(Duration::from_millis(delay_ms));
    }
    assert_eq!(
        h.texts().iter().filter(|t| t.contains("in 5 seconds")).count(),
        2
    );
}

#[test]
fn test_transport_error_only_renders_notice() {
    let mut h = Harness::connected("abc123");
    let socket = h.socket();

    h.event(socket, SocketEvent::Error("connection reset".into()));
    assert_eq!(h.last_line(), error("WebSocket error occurred"));
    assert_eq!(h.manager.state(), ConnectionState::Open);
    assert!(h.manager.pending_reconnect().is_none());
}

#[test]
fn test_failed_open_goes_through_retry_path() {
    let mut h = Harness::new();
    h.manager.transport_mut().fail_open = true;

    let result = h.manager.connect("abc123", false);
    assert!(matches!(result, Err(SessionError::Transport(_))));

    let texts = h.texts();
    assert_eq!(
        texts,
        [
            "WebSocket error occurred",
            "Connection died",
            "Attempting to reconnect in 2 seconds (attempt 1/3)..."
        ]
    );
    assert!(h.manager.pending_reconnect().is_some());
}

// ============================================================================
// Disconnect
// ============================================================================

#[test]
fn test_disconnect_closes_with_user_reason() {
    let mut h = Harness::connected("abc123");
    let socket = h.socket();

    h.manager.disconnect();

    assert_eq!(
        h.manager.transport().calls.last(),
        Some(&Call::Close(
            socket,
            CloseReason::with_reason(CloseCode::Normal, "User initiated disconnect")
        ))
    );
    assert_eq!(h.last_line(), system("Disconnected from server"));
    assert_eq!(h.last_controls(), ControlState::disconnected());
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);

    // The transport's close report for the dropped socket changes nothing.
    let rendered = h.texts().len();
    h.event(
        socket,
        SocketEvent::Closed(CloseInfo::clean(CloseCode::Normal, "User initiated disconnect")),
    );
    assert_eq!(h.texts().len(), rendered);
}

#[test]
fn test_disconnect_cancels_pending_retry() {
    let mut h = Harness::connected("abc123");
    h.drop_connection();
    assert!(h.manager.pending_reconnect().is_some());

    h.manager.disconnect();
    assert!(h.manager.pending_reconnect().is_none());
    assert_eq!(h.manager.scheduler().active_count(), 0);
    assert_eq!(h.last_line(), system("Disconnected from server"));
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);

    h.advance(Duration::from_secs(10));
    assert_eq!(h.opens().len(), 1);
    assert!(!h.texts().contains(&"Reconnecting...".to_string()));
}

#[test]
fn test_disconnect_without_session_is_noop() {
    let mut h = Harness::new();
    h.manager.disconnect();

    assert!(h.texts().is_empty());
    assert!(h.manager.transport().calls.is_empty());
}

#[test]
fn test_disconnect_keeps_retry_counter() {
    let mut h = Harness::connected("abc123");
    h.drop_connection();
    h.advance(Duration::from_secs(2));
    h.manager.disconnect();

    assert_eq!(h.manager.reconnect_attempts(), 1);
}

// ============================================================================
// Socket identity
// ============================================================================

#[test]
fn test_connect_replaces_previous_socket() {
    let mut h = Harness::connected("abc123");
    let old = h.socket();

    h.manager.connect("xyz", false).unwrap();
    let new = h.socket();
    assert_ne!(old, new);
    assert!(h
        .manager
        .transport()
        .calls
        .contains(&Call::Close(old, CloseReason::normal())));

    h.event(old, SocketEvent::Message(r#"{"type":"resumed","message":"x"}"#.into()));
    h.event(old, SocketEvent::Closed(CloseInfo::abnormal()));
    assert!(h.texts().is_empty());
    assert!(h.manager.pending_reconnect().is_none());
    assert_eq!(h.manager.state(), ConnectionState::Connecting);

    h.event(new, SocketEvent::Opened);
    assert_eq!(h.last_line(), system("Connected to server"));
}

#[test]
fn test_events_for_unknown_socket_are_ignored() {
    let mut h = Harness::new();
    h.event(SocketId::new(99), SocketEvent::Opened);
    h.event(SocketId::new(99), SocketEvent::Closed(CloseInfo::abnormal()));

    assert!(h.texts().is_empty());
    assert_eq!(h.manager.state(), ConnectionState::Disconnected);
}

#[test]
fn test_stale_timer_is_ignored() {
    let mut h = Harness::connected("abc123");
    h.drop_connection();
    let stale = h.manager.pending_reconnect().unwrap();

    h.manager.connect("abc123", false).unwrap();
    h.manager.handle_timer(stale);

    assert_eq!(h.opens().len(), 2);
    assert!(!h.texts().contains(&"Reconnecting...".to_string()));
}

// ============================================================================
// Signals
// ============================================================================

#[test]
fn test_state_changes_are_signalled() {
    let mut h = Harness::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    h.manager
        .state_changed
        .connect(move |state| seen_clone.lock().push(*state));

    h.manager.connect("abc123", false).unwrap();
    h.open();
    h.drop_connection();
    h.advance(Duration::from_secs(2));
    h.open();
    h.receive(r#"{"type":"completed","message":"done"}"#);

    assert_eq!(
        *seen.lock(),
        vec![
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::AwaitingRetry,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Completed,
        ]
    );
}

#[test]
fn test_unbind_stops_delivery() {
    let mut h = Harness::new();
    let display = Arc::new(Mutex::new(RecordingDisplay::default()));
    let binding = h.manager.bind_display(display.clone());

    h.manager.connect("", false).unwrap_err();
    assert_eq!(display.lock().lines.len(), 1);

    assert_eq!(h.manager.line_rendered.connection_count(), 2);
    h.manager.unbind(binding);
    assert_eq!(h.manager.line_rendered.connection_count(), 1);
    assert_eq!(h.manager.display_cleared.connection_count(), 1);
    h.manager.connect("", false).unwrap_err();
    assert_eq!(display.lock().lines.len(), 1);
    assert_eq!(h.display.lock().lines.len(), 2);
}
