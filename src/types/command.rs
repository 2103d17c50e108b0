//! Parsed terminal input

use serde::{Deserialize, Serialize};

use crate::types::PathwaySelection;

/// Keyword commands recognised regardless of offer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BareCommand {
    Help,
    Stats,
    Clear,
    Logout,
}

impl BareCommand {
    pub const ALL: [BareCommand; 4] = [
        BareCommand::Help,
        BareCommand::Stats,
        BareCommand::Clear,
        BareCommand::Logout,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            BareCommand::Help => "help",
            BareCommand::Stats => "stats",
            BareCommand::Clear => "clear",
            BareCommand::Logout => "logout",
        }
    }
}

/// Outcome of interpreting one line of input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParsedInput {
    Command(BareCommand),
    Select(PathwaySelection),
    /// No grammar rule matched: a new state description
    Describe(String),
}
