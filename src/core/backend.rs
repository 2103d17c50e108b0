//! Client for the state-detection / playlist-generation backend
//!
//! The backend is a set of webhooks:
//! - POST {base}/stateshift           - detect a state, returns a `PathwayOffer`
//! - POST {base}/stateshift/generate  - generate a playlist, returns text
//! - POST {base}/public-state         - current public state (status probe)
//! - HEAD {base}/sms-checkin          - SMS workflow probe

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::sources::http_client;
use crate::error::{Error, Result};
use crate::types::{GenerationRequest, PathwayOffer, SystemStatus};

/// Detection, generation and health of the automation backend
#[async_trait]
pub trait StateBackend: Send + Sync {
    async fn detect(&self, user_input: &str) -> Result<PathwayOffer>;

    /// Returns the playlist description as plain text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Never fails; problems are reported inside the status
    async fn status(&self) -> SystemStatus;
}

/// Webhook-backed implementation
pub struct WebhookBackend {
    base_url: String,
    http_client: reqwest::Client,
}

impl WebhookBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: http_client(timeout),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<reqwest::Response> {
        let url = self.endpoint(path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )));
        }
        Ok(response)
    }

    async fn sms_workflow(&self) -> &'static str {
        match self.http_client.head(self.endpoint("sms-checkin")).send().await {
            // A registered webhook answers HEAD with 405
            Ok(resp) if resp.status().as_u16() == 200 || resp.status().as_u16() == 405 => "active",
            Ok(_) => "inactive",
            Err(e) => {
                debug!(error = %e, "SMS workflow probe failed");
                "error"
            }
        }
    }
}

#[async_trait]
impl StateBackend for WebhookBackend {
    async fn detect(&self, user_input: &str) -> Result<PathwayOffer> {
        info!(chars = user_input.len(), "Requesting state detection");
        let body = json!({
            "user_input": user_input,
            "context": "",
            "capacity": null,
        });
        let response = self.post_json("stateshift", &body).await?;
        let offer: PathwayOffer = response
            .json()
            .await
            .map_err(|e| Error::Backend(format!("invalid detection response: {}", e)))?;
        debug!(state = %offer.detected_state, pathways = offer.len(), "State detected");
        Ok(offer)
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        info!(
            source = %request.source_state,
            target = %request.target_state,
            duration = request.duration,
            discovery = request.discovery_percentage,
            "Requesting playlist generation"
        );
        let body = serde_json::to_value(request)?;
        let response = self.post_json("stateshift/generate", &body).await?;
        response
            .text()
            .await
            .map_err(|e| Error::Backend(format!("unreadable generation response: {}", e)))
    }

    async fn status(&self) -> SystemStatus {
        let current_state = match self.post_json("public-state", &json!({})).await {
            Ok(resp) => match resp.json::<serde_json::Value>().await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(error = %e, "Public state returned an unreadable body");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Public state unavailable");
                None
            }
        };

        SystemStatus {
            ok: true,
            timestamp: Utc::now(),
            backend: if current_state.is_some() { "connected" } else { "disconnected" }.to_string(),
            sms_workflow: self.sms_workflow().await.to_string(),
            current_state,
            error: None,
        }
    }
}
