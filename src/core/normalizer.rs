//! Field normalizer: raw table rows -> `CanonicalCheckin`
//!
//! Each table declares a `FieldMap` listing, per canonical attribute, the raw
//! field names to try in priority order. The first non-empty value wins.
//! Normalization is pure: no I/O, no clock.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, MalformedReason, Result};
use crate::types::{CanonicalCheckin, CheckinSource, SourceTag, TaggedRecord};

lazy_static! {
    /// Emotion label embedded in the AI summary text
    static ref RE_EMOTION: Regex = Regex::new(r"(?i)Detected emotion is '([^']+)'").unwrap();
}

/// Raw field holding the AI summary text
pub const AI_SUMMARY_FIELD: &str = "Summary (AI)";
/// Raw field holding the AI micro-intervention text
pub const AI_INTERVENTION_FIELD: &str = "Suggested Micro-Intervention (AI)";

/// Candidate raw field names for each canonical attribute
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub timestamp: &'static [&'static str],
    pub detected_state: &'static [&'static str],
    pub feeling_text: &'static [&'static str],
    pub summary_text: &'static [&'static str],
    pub intervention_text: &'static [&'static str],
    /// Field carrying provenance; `None` means the table's own tag decides
    pub source: Option<&'static str>,
    pub emotion_intensity: &'static [&'static str],
    pub state_mode: &'static [&'static str],
    pub state_phase: &'static [&'static str],
    pub archetype: &'static [&'static str],
    pub direction: &'static [&'static str],
    pub confidence: &'static [&'static str],
    pub glyph: &'static [&'static str],
    pub reasoning: &'static [&'static str],
}

/// Intake inbox: SMS/voice rows, provenance in their own `source` field
pub const INTAKE_FIELDS: FieldMap = FieldMap {
    timestamp: &["timestamp", "Created"],
    detected_state: &["state", "pattern", "tags_raw"],
    feeling_text: &["i_feel_text", "feeling"],
    summary_text: &["summary", "essence"],
    intervention_text: &["suggested_prompt", "micro_invitation"],
    source: Some("source"),
    emotion_intensity: &["emotion_intensity"],
    state_mode: &["state_mode"],
    state_phase: &["state_phase"],
    archetype: &["archetype"],
    direction: &["direction"],
    confidence: &["detection_confidence"],
    glyph: &["glyph"],
    reasoning: &["reasoning"],
};

/// Personal check-ins table
pub const PERSONAL_FIELDS: FieldMap = FieldMap {
    timestamp: &["timestamp", "Created"],
    detected_state: &["state", "pattern", "tags_raw"],
    feeling_text: &["feeling", "i_feel_text"],
    summary_text: &["essence", "summary"],
    intervention_text: &["micro_invitation", "suggested_prompt"],
    source: None,
    emotion_intensity: &["emotion_intensity"],
    state_mode: &["state_mode"],
    state_phase: &["state_phase"],
    archetype: &["archetype"],
    direction: &["direction"],
    confidence: &["detection_confidence"],
    glyph: &["glyph"],
    reasoning: &["reasoning"],
};

impl FieldMap {
    pub fn for_tag(tag: SourceTag) -> &'static FieldMap {
        match tag {
            SourceTag::Intake => &INTAKE_FIELDS,
            SourceTag::Personal => &PERSONAL_FIELDS,
        }
    }
}

/// Normalize one tagged record
///
/// Fails with `MalformedRecord` when the id or timestamp cannot be resolved;
/// callers drop such records and continue with the batch.
pub fn normalize(tagged: &TaggedRecord) -> Result<CanonicalCheckin> {
    let map = FieldMap::for_tag(tagged.tag);
    let record = &tagged.record;
    let fields = &record.fields;

    let id = record
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(Error::MalformedRecord {
            id: None,
            reason: MalformedReason::R101_MISSING_ID,
        })?
        .to_string();

    let timestamp = resolve_timestamp(fields, map.timestamp, record.created_time.as_deref())
        .map_err(|reason| Error::MalformedRecord { id: Some(id.clone()), reason })?;

    let source = match (tagged.tag, map.source) {
        (SourceTag::Personal, _) => CheckinSource::Personal,
        (_, Some(field)) => first_text(fields, &[field])
            .map(|s| CheckinSource::from_field(&s))
            .unwrap_or(CheckinSource::Unknown),
        (_, None) => CheckinSource::Unknown,
    };

    let ai_summary = first_text(fields, &[AI_SUMMARY_FIELD]);
    let emotion = ai_summary.as_deref().and_then(extract_emotion);

    let mut checkin = CanonicalCheckin::new(id, timestamp, source);
    checkin.feeling_text = first_text(fields, map.feeling_text);
    checkin.detected_state = first_label(fields, map.detected_state).map(|s| s.to_lowercase());
    checkin.emotion = emotion;
    checkin.emotion_intensity = first_value(fields, map.emotion_intensity);
    checkin.state_mode = first_text(fields, map.state_mode);
    checkin.state_phase = first_text(fields, map.state_phase);
    checkin.archetype = first_text(fields, map.archetype);
    checkin.direction = first_text(fields, map.direction);
    checkin.confidence = first_value(fields, map.confidence);
    checkin.glyph = first_text(fields, map.glyph);
    checkin.summary_text = first_text(fields, map.summary_text);
    checkin.intervention_text = first_text(fields, map.intervention_text);
    checkin.ai_summary = ai_summary;
    checkin.ai_intervention = first_text(fields, &[AI_INTERVENTION_FIELD]);
    checkin.reasoning = first_text(fields, map.reasoning);
    Ok(checkin)
}

/// Pull the emotion label out of an AI summary; `None` when the pattern is absent
pub fn extract_emotion(summary: &str) -> Option<String> {
    RE_EMOTION
        .captures(summary)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an ISO-8601 timestamp: RFC 3339, naive date-time (taken as UTC), or bare date
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn resolve_timestamp(
    fields: &Map<String, Value>,
    candidates: &[&str],
    created_time: Option<&str>,
) -> std::result::Result<DateTime<Utc>, MalformedReason> {
    let raw: Vec<String> = candidates
        .iter()
        .filter_map(|name| fields.get(*name).and_then(value_text))
        .chain(created_time.map(str::to_string).filter(|s| !s.trim().is_empty()))
        .collect();

    if raw.is_empty() {
        return Err(MalformedReason::R102_MISSING_TIMESTAMP);
    }
    raw.iter()
        .find_map(|s| parse_timestamp(s))
        .ok_or(MalformedReason::R103_INVALID_TIMESTAMP)
}

/// First candidate field with non-empty text
fn first_text(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|name| fields.get(*name).and_then(value_text))
}

/// First candidate field holding a single label; a list yields its first non-empty item
fn first_label(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|name| fields.get(*name).and_then(label_text))
}

fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(label_text),
        Value::Object(obj) => obj.get("value").and_then(label_text),
        other => value_text(other),
    }
}

/// First candidate field that is present and non-empty, carried through unchanged
fn first_value(fields: &Map<String, Value>, candidates: &[&str]) -> Option<Value> {
    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|v| value_text(v).is_some())
        .cloned()
}

/// Text view of a field value
///
/// Handles plain strings, numbers, booleans, lists (joined) and AI-field
/// objects of the form `{ "value": ... }`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(obj) => obj.get("value").and_then(value_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawRecord;
    use serde_json::json;

    fn intake(fields: Value) -> TaggedRecord {
        TaggedRecord::new(
            SourceTag::Intake,
            RawRecord::new("recI", "2024-03-01T08:00:00.000Z", fields),
        )
    }

    #[test]
    fn test_extract_emotion() {
        assert_eq!(
            extract_emotion("User sounds tired. Detected emotion is 'Weary'."),
            Some("Weary".to_string())
        );
        assert_eq!(
            extract_emotion("detected EMOTION is 'calm'"),
            Some("calm".to_string())
        );
        assert_eq!(extract_emotion("no emotion here"), None);
        assert_eq!(extract_emotion("Detected emotion is ''"), None);
        assert_eq!(extract_emotion("Detected emotion is 'unterminated"), None);
    }

    #[test]
    fn test_intake_state_falls_back_to_pattern() {
        let checkin = normalize(&intake(json!({"pattern": "Voltage", "source": "sms"}))).unwrap();
        assert_eq!(checkin.detected_state.as_deref(), Some("voltage"));
        assert_eq!(checkin.source, CheckinSource::Sms);
    }

    #[test]
    fn test_empty_string_is_skipped() {
        let checkin = normalize(&intake(json!({"state": "  ", "tags_raw": ["lowline"]}))).unwrap();
        assert_eq!(checkin.detected_state.as_deref(), Some("lowline"));
        assert_eq!(checkin.source, CheckinSource::Unknown);
    }

    #[test]
    fn test_multi_tag_state_takes_first_tag() {
        let checkin = normalize(&intake(json!({"tags_raw": ["", "Voltage", "Lowline"]}))).unwrap();
        assert_eq!(checkin.detected_state.as_deref(), Some("voltage"));
    }

    #[test]
    fn test_timestamp_fallback_to_created_time() {
        let checkin = normalize(&intake(json!({}))).unwrap();
        assert_eq!(checkin.timestamp.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_timestamp_prefers_explicit_field() {
        let checkin = normalize(&intake(json!({
            "timestamp": "2024-03-02T09:30:00Z",
            "Created": "2024-03-01T00:00:00Z"
        })))
        .unwrap();
        assert_eq!(checkin.timestamp.to_rfc3339(), "2024-03-02T09:30:00+00:00");
    }

    #[test]
    fn test_unparseable_timestamp_is_malformed() {
        let record = TaggedRecord::new(
            SourceTag::Personal,
            RawRecord {
                id: Some("recX".into()),
                created_time: None,
                fields: json!({"timestamp": "yesterday-ish"}).as_object().unwrap().clone(),
            },
        );
        match normalize(&record) {
            Err(Error::MalformedRecord { id, reason }) => {
                assert_eq!(id.as_deref(), Some("recX"));
                assert_eq!(reason, MalformedReason::R103_INVALID_TIMESTAMP);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let record = TaggedRecord::new(SourceTag::Intake, RawRecord::default());
        assert!(matches!(
            normalize(&record),
            Err(Error::MalformedRecord { reason: MalformedReason::R101_MISSING_ID, .. })
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T08:00:00.000Z").is_some());
        assert!(parse_timestamp("2024-03-01T08:00:00+02:00").is_some());
        assert!(parse_timestamp("2024-03-01T08:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("03/01/2024").is_none());
    }

    #[test]
    fn test_scalar_fields_carried_unchanged() {
        let checkin = normalize(&intake(json!({
            "emotion_intensity": 7,
            "detection_confidence": "0.82",
            "glyph": "~"
        })))
        .unwrap();
        assert_eq!(checkin.emotion_intensity, Some(json!(7)));
        assert_eq!(checkin.confidence, Some(json!("0.82")));
        assert_eq!(checkin.glyph.as_deref(), Some("~"));
    }
}
