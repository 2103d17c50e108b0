//! Canonical check-in representation
//!
//! Every remote row, whatever table it came from, becomes one `CanonicalCheckin`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provenance of a check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckinSource {
    Intake,
    Personal,
    Sms,
    Unknown,
}

impl CheckinSource {
    /// Parse a free-form source field; unrecognised values map to `Unknown`
    pub fn from_field(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "intake" => CheckinSource::Intake,
            "personal" => CheckinSource::Personal,
            "sms" => CheckinSource::Sms,
            _ => CheckinSource::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinSource::Intake => "intake",
            CheckinSource::Personal => "personal",
            CheckinSource::Sms => "sms",
            CheckinSource::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CheckinSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified, source-independent check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCheckin {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: CheckinSource,
    pub feeling_text: Option<String>,
    /// Lower-case state label
    pub detected_state: Option<String>,
    pub emotion: Option<String>,
    pub emotion_intensity: Option<Value>,
    pub state_mode: Option<String>,
    pub state_phase: Option<String>,
    pub archetype: Option<String>,
    pub direction: Option<String>,
    pub confidence: Option<Value>,
    pub glyph: Option<String>,
    pub summary_text: Option<String>,
    pub intervention_text: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_intervention: Option<String>,
    pub reasoning: Option<String>,
}

impl CanonicalCheckin {
    /// Minimal check-in with every optional attribute unset
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, source: CheckinSource) -> Self {
        Self {
            id: id.into(),
            timestamp,
            source,
            feeling_text: None,
            detected_state: None,
            emotion: None,
            emotion_intensity: None,
            state_mode: None,
            state_phase: None,
            archetype: None,
            direction: None,
            confidence: None,
            glyph: None,
            summary_text: None,
            intervention_text: None,
            ai_summary: None,
            ai_intervention: None,
            reasoning: None,
        }
    }
}

/// Anything the stats aggregator can count
pub trait Observation {
    fn observed_at(&self) -> DateTime<Utc>;
    fn state_label(&self) -> Option<&str>;
    fn emotion_label(&self) -> Option<&str>;
    fn source(&self) -> CheckinSource;
}

impl Observation for CanonicalCheckin {
    fn observed_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn state_label(&self) -> Option<&str> {
        self.detected_state.as_deref()
    }

    fn emotion_label(&self) -> Option<&str> {
        self.emotion.as_deref()
    }

    fn source(&self) -> CheckinSource {
        self.source
    }
}
