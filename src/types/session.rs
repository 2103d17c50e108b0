//! Locally retained session events
//!
//! The log is append-only: events are never mutated once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CheckinSource, Observation};

/// One entry of the local session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSession {
    /// Epoch milliseconds at append time, strictly increasing within a log
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: SessionEvent,
}

/// What happened in a local session entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A state was detected from free text
    Detection {
        user_input: String,
        detected_state: String,
        #[serde(default)]
        reasoning: Option<String>,
        pathway_count: usize,
    },
    /// A playlist was generated for a pathway
    Generation {
        source_state: String,
        target_state: String,
        duration: u32,
        discovery: u8,
        playlist_generated: bool,
        playlist_result: String,
    },
}

impl LocalSession {
    pub fn detected_state(&self) -> Option<&str> {
        match &self.event {
            SessionEvent::Detection { detected_state, .. } => Some(detected_state.as_str()),
            SessionEvent::Generation { .. } => None,
        }
    }

    pub fn target_state(&self) -> Option<&str> {
        match &self.event {
            SessionEvent::Generation { target_state, .. } => Some(target_state.as_str()),
            SessionEvent::Detection { .. } => None,
        }
    }

    pub fn is_playlist(&self) -> bool {
        matches!(
            self.event,
            SessionEvent::Generation { playlist_generated: true, .. }
        )
    }
}

impl Observation for LocalSession {
    fn observed_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn state_label(&self) -> Option<&str> {
        self.detected_state()
    }

    fn emotion_label(&self) -> Option<&str> {
        None
    }

    fn source(&self) -> CheckinSource {
        CheckinSource::Unknown
    }
}
