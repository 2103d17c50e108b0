//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

use museshift::core::{FetchQuery, RecordSource, StateBackend};
use museshift::types::{
    GenerationRequest, PathwayOffer, PathwayOption, RawRecord, SourceTag, SystemStatus,
};
use museshift::{Error, Result};

/// Source returning fixed rows, optionally after a delay
pub struct StaticSource {
    pub tag: SourceTag,
    pub records: Vec<RawRecord>,
    pub delay: Duration,
}

impl StaticSource {
    pub fn new(tag: SourceTag, records: Vec<RawRecord>) -> Self {
        Self { tag, records, delay: Duration::ZERO }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawRecord>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.records.iter().take(query.limit).cloned().collect())
    }
}

/// Source that always fails
pub struct FailingSource(pub SourceTag);

#[async_trait]
impl RecordSource for FailingSource {
    fn tag(&self) -> SourceTag {
        self.0
    }

    async fn fetch(&self, _query: &FetchQuery) -> Result<Vec<RawRecord>> {
        Err(Error::SourceUnavailable {
            source_name: self.0.to_string(),
            reason: "HTTP 503".to_string(),
        })
    }
}

/// Intake row with a state and an explicit timestamp
pub fn intake_row(id: &str, timestamp: &str, state: &str) -> RawRecord {
    RawRecord::new(
        id,
        timestamp,
        json!({"timestamp": timestamp, "state": state, "source": "sms"}),
    )
}

/// Personal row with a state and an explicit timestamp
pub fn personal_row(id: &str, timestamp: &str, state: &str) -> RawRecord {
    RawRecord::new(id, timestamp, json!({"timestamp": timestamp, "pattern": state}))
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

/// Backend with a fixed three-pathway offer that records generation requests
pub struct MockBackend {
    pub detected_state: String,
    pub fail_detect: bool,
    pub fail_generate: bool,
    pub requests: Mutex<Vec<GenerationRequest>>,
    pub detections: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(detected_state: &str) -> Self {
        Self {
            detected_state: detected_state.to_string(),
            fail_detect: false,
            fail_generate: false,
            requests: Mutex::new(Vec::new()),
            detections: Mutex::new(Vec::new()),
        }
    }

    pub fn offer(&self) -> PathwayOffer {
        PathwayOffer {
            detected_state: self.detected_state.clone(),
            reasoning: Some("short sentences, high tempo".to_string()),
            pathway_options: ["clearmark", "lowline", "voltage"]
                .iter()
                .map(|target| PathwayOption {
                    target_state: target.to_string(),
                    pathway: format!("ease toward {}", target),
                    physical_effect: "slower breath".to_string(),
                    duration: "20-30 min".to_string(),
                    warning: None,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl StateBackend for MockBackend {
    async fn detect(&self, user_input: &str) -> Result<PathwayOffer> {
        self.detections.lock().unwrap().push(user_input.to_string());
        if self.fail_detect {
            return Err(Error::Backend("HTTP 502: Bad Gateway".to_string()));
        }
        Ok(self.offer())
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_generate {
            return Err(Error::Backend("HTTP 500: Internal Server Error".to_string()));
        }
        Ok(format!("{} -> {} playlist", request.source_state, request.target_state))
    }

    async fn status(&self) -> SystemStatus {
        SystemStatus {
            ok: true,
            timestamp: Utc::now(),
            backend: "connected".to_string(),
            sms_workflow: "active".to_string(),
            current_state: Some(Value::String(self.detected_state.clone())),
            error: None,
        }
    }
}
