//! Local session log
//!
//! Append-only sequence of `LocalSession`s stored as one JSON array under a
//! single key. Every append is read-modify-write of the whole log; a single
//! writer is assumed.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::core::store::KvStore;
use crate::error::Result;
use crate::types::{LocalSession, SessionEvent};

/// Store key of the session log
pub const SESSIONS_KEY: &str = "museshift_sessions";

#[derive(Clone)]
pub struct SessionLog {
    store: Arc<dyn KvStore>,
}

impl SessionLog {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Full snapshot of the log, oldest first
    pub fn load(&self) -> Result<Vec<LocalSession>> {
        match self.store.get(SESSIONS_KEY)? {
            Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(&json)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Append one event stamped with `now`
    pub fn append(&self, event: SessionEvent, now: DateTime<Utc>) -> Result<LocalSession> {
        let mut sessions = self.load()?;

        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = match sessions.last() {
            Some(last) if last.id >= millis => last.id + 1,
            _ => millis,
        };
        let session = LocalSession { id, timestamp: now, event };
        sessions.push(session.clone());

        self.store.set(SESSIONS_KEY, &serde_json::to_string(&sessions)?)?;
        debug!(id, total = sessions.len(), "Appended session event");
        Ok(session)
    }

    /// Empty the log
    pub fn clear(&self) -> Result<()> {
        self.store.set(SESSIONS_KEY, "[]")?;
        debug!("Cleared session log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use chrono::TimeZone;

    fn detection(state: &str) -> SessionEvent {
        SessionEvent::Detection {
            user_input: "wired".into(),
            detected_state: state.into(),
            reasoning: None,
            pathway_count: 3,
        }
    }

    #[test]
    fn test_append_load_clear() {
        let log = SessionLog::new(Arc::new(MemoryStore::new()));
        assert!(log.load().unwrap().is_empty());

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        log.append(detection("voltage"), now).unwrap();
        log.append(detection("fraymark"), now).unwrap();

        let sessions = log.load().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].detected_state(), Some("voltage"));
        assert!(sessions[1].id > sessions[0].id, "ids stay strictly increasing");

        log.clear().unwrap();
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_log_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set(SESSIONS_KEY, "{not json").unwrap();
        let log = SessionLog::new(store);
        assert!(log.load().is_err());
        assert!(log.append(detection("voltage"), Utc::now()).is_err());
    }
}
