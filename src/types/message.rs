//! Terminal transcript messages

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::EnergyState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    System,
    User,
    State,
    Pathway,
    Playlist,
    Error,
}

/// One line (or block) of terminal output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    /// State label used for coloring `State` and `Pathway` lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Message {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into(), state: None }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageKind::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageKind::User, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        match self.kind {
            MessageKind::System => format!("[ {} ]", self.text).green().to_string(),
            MessageKind::User => format!("  > {}", self.text).cyan().to_string(),
            MessageKind::State => {
                let (r, g, b) = EnergyState::rgb_for_label(self.state.as_deref());
                self.text.truecolor(r, g, b).bold().to_string()
            }
            MessageKind::Pathway => indent(&self.text, "      | ").yellow().to_string(),
            MessageKind::Playlist => self.text.bright_green().to_string(),
            MessageKind::Error => self.text.red().to_string(),
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        match self.kind {
            MessageKind::System => format!("[ {} ]", self.text),
            MessageKind::User => format!("> {}", self.text),
            _ => self.text.clone(),
        }
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What the caller should do after printing a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplyAction {
    #[default]
    None,
    /// Drop the transcript and reprint the banner
    ResetScreen,
    /// Credentials removed; end the session
    Logout,
}

/// Everything produced by one input line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub messages: Vec<Message>,
    pub action: ReplyAction,
}

impl Reply {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, action: ReplyAction::None }
    }

    pub fn with_action(mut self, action: ReplyAction) -> Self {
        self.action = action;
        self
    }

    pub fn has_error(&self) -> bool {
        self.messages.iter().any(|m| m.kind == MessageKind::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parseable_format() {
        assert_eq!(Message::system("ready").to_parseable_string(), "[ ready ]");
        assert_eq!(Message::user("hi").to_parseable_string(), "> hi");
        assert_eq!(Message::error("bad").to_parseable_string(), "bad");
    }

    #[test]
    fn test_pathway_indent() {
        assert_eq!(indent("a\nb", "| "), "| a\n| b");
    }
}
