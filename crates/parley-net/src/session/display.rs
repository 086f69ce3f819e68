//! Contracts for the collaborators that show what the manager emits.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use parley_core::{ConnectionId, Scheduler};

use super::manager::ConnectionManager;
use crate::websocket::Transport;

/// How a rendered line should be styled.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    /// Lifecycle notices from the client itself.
    System,
    /// Anything that went wrong.
    Error,
    /// The local user's own messages.
    User,
    /// A remote participant, tagged with the lowercased sender name.
    Sender(String),
}

impl MessageCategory {
    /// Category for a line from `sender`.
    pub fn from_sender(sender: &str) -> Self {
        let tag = sender.to_lowercase();
        if tag == "user" {
            Self::User
        } else {
            Self::Sender(tag)
        }
    }

    /// The tag as a style class name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::Error => "error",
            Self::User => "user",
            Self::Sender(tag) => tag,
        }
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line for the display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayLine {
    pub text: String,
    pub category: MessageCategory,
}

impl DisplayLine {
    pub fn new(text: impl Into<String>, category: MessageCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.text)
    }
}

/// Which controls a UI should enable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub connect_enabled: bool,
    pub disconnect_enabled: bool,
    /// Message input and send button.
    pub input_enabled: bool,
    /// Whether the status indicator should read "Connected".
    pub connected: bool,
}

impl ControlState {
    /// Controls while a socket is open. A completed session keeps input off.
    pub fn connected(session_completed: bool) -> Self {
        Self {
            connect_enabled: false,
            disconnect_enabled: true,
            input_enabled: !session_completed,
            connected: true,
        }
    }

    /// Controls while no socket is open.
    pub fn disconnected() -> Self {
        Self {
            connect_enabled: true,
            disconnect_enabled: false,
            input_enabled: false,
            connected: false,
        }
    }

    /// Text for a status indicator.
    pub fn status_label(&self) -> &'static str {
        if self.connected {
            "Connected"
        } else {
            "Disconnected"
        }
    }
}

/// Where rendered lines go. Appends in order; scrolling is up to the sink.
pub trait DisplaySink: Send {
    fn render(&mut self, line: &DisplayLine);

    /// Drop everything shown so far (a fresh session starts).
    fn clear(&mut self);
}

/// The connect/disconnect/send controls and the message input.
pub trait ControlSurface: Send {
    fn set_controls(&mut self, state: ControlState);

    /// Empty the message input after a successful send.
    fn clear_input(&mut self);
}

/// Connections made by [`ConnectionManager::bind_display`] and
/// [`ConnectionManager::bind_controls`], for later unbinding.
#[derive(Debug, Default)]
pub struct UiBinding {
    rendered: Option<ConnectionId>,
    display_cleared: Option<ConnectionId>,
    controls_changed: Option<ConnectionId>,
    input_cleared: Option<ConnectionId>,
}

impl<T: Transport, S: Scheduler> ConnectionManager<T, S> {
    /// Route rendered lines and clears to `sink`.
    pub fn bind_display<D>(&self, sink: Arc<Mutex<D>>) -> UiBinding
    where
        D: DisplaySink + 'static,
    {
        let render_sink = sink.clone();
        let rendered = self
            .line_rendered
            .connect(move |line| render_sink.lock().render(line));
        let cleared = self.display_cleared.connect(move |_| sink.lock().clear());

        UiBinding {
            rendered: Some(rendered),
            display_cleared: Some(cleared),
            ..UiBinding::default()
        }
    }

    /// Route control state changes and input clears to `surface`.
    pub fn bind_controls<C>(&self, surface: Arc<Mutex<C>>) -> UiBinding
    where
        C: ControlSurface + 'static,
    {
        let control_surface = surface.clone();
        let changed = self
            .controls_changed
            .connect(move |state| control_surface.lock().set_controls(*state));
        let cleared = self
            .input_cleared
            .connect(move |_| surface.lock().clear_input());

        UiBinding {
            controls_changed: Some(changed),
            input_cleared: Some(cleared),
            ..UiBinding::default()
        }
    }

    /// Disconnect everything a binding connected.
    pub fn unbind(&self, binding: UiBinding) {
        if let Some(id) = binding.rendered {
            self.line_rendered.disconnect(id);
        }
        if let Some(id) = binding.display_cleared {
            self.display_cleared.disconnect(id);
        }
        if let Some(id) = binding.controls_changed {
            self.controls_changed.disconnect(id);
        }
        if let Some(id) = binding.input_cleared {
            self.input_cleared.disconnect(id);
        }
    }
}
