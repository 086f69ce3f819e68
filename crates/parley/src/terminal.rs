//! Line-oriented terminal front end: a display sink and a control surface.

use std::io::Write;

use parley_core::logging::targets;
use parley_net::{ControlState, ControlSurface, DisplayLine, DisplaySink};

use crate::command::ClientCommand;

/// Prints rendered lines as `[category] text`.
pub struct TerminalDisplay<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            tracing::warn!(target: targets::CLIENT, error = %err, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> DisplaySink for TerminalDisplay<W> {
    fn render(&mut self, line: &DisplayLine) {
        self.write_line(&line.to_string());
    }

    fn clear(&mut self) {
        // Scrollback stays; a rule marks where the new session starts.
        self.write_line("----------------------------------------");
    }
}

/// Tracks which controls are enabled and reports status changes.
///
/// A terminal has no buttons to grey out, so commands typed while their
/// control is disabled are refused by [`admit`](Self::admit) instead.
pub struct TerminalControls<W: Write + Send> {
    state: ControlState,
    out: W,
}

impl<W: Write + Send> TerminalControls<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: ControlState::disconnected(),
            out,
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Whether `command` may be forwarded under the current control state.
    /// Refusals are explained on the terminal.
    pub fn admit(&mut self, command: &ClientCommand) -> bool {
        let refusal = match command {
            ClientCommand::Send(_) if !self.state.input_enabled => {
                Some("message input is disabled")
            }
            ClientCommand::Connect(_) if !self.state.connect_enabled => {
                Some("already connected, use /disconnect first")
            }
            _ => None,
        };

        match refusal {
            Some(reason) => {
                self.write_line(&format!("({reason}; status: {})", self.state.status_label()));
                false
            }
            None => true,
        }
    }

    fn write_line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            tracing::warn!(target: targets::CLIENT, error = %err, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> ControlSurface for TerminalControls<W> {
    fn set_controls(&mut self, state: ControlState) {
        let previous = self.state;
        self.state = state;

        if previous.connected != state.connected {
            self.write_line(&format!("== {} ==", state.status_label()));
        } else if previous.input_enabled && !state.input_enabled {
            self.write_line("== Input disabled ==");
        }
    }

    fn clear_input(&mut self) {
        // The line was consumed when it was read.
    }
}
