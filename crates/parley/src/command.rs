//! User input for the terminal client.

/// One line of user input, interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientCommand {
    /// `/connect <conversation-id>`
    Connect(String),
    /// `/disconnect`
    Disconnect,
    /// `/quit` or `/exit`
    Quit,
    /// Anything else is a chat message.
    Send(String),
}

impl ClientCommand {
    /// Interpret a line read from the terminal. The trailing newline, if
    /// any, is not part of the message.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("/connect")
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            return Self::Connect(rest.trim().to_string());
        }

        match trimmed {
            "/disconnect" => Self::Disconnect,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Send(line.to_string()),
        }
    }
}
