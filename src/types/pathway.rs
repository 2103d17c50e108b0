//! Pathway offers, selections and the generation request built from them

use serde::{Deserialize, Serialize};

/// One candidate transition offered by the detection backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathwayOption {
    pub target_state: String,
    /// Description of the transition
    #[serde(default)]
    pub pathway: String,
    #[serde(default)]
    pub physical_effect: String,
    /// Free-text duration estimate, e.g. "20-30 min"
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Detection result: the state plus the pathways out of it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathwayOffer {
    pub detected_state: String,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub pathway_options: Vec<PathwayOption>,
}

impl PathwayOffer {
    pub fn len(&self) -> usize {
        self.pathway_options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathway_options.is_empty()
    }

    /// Option at a 0-based index
    pub fn get(&self, index: usize) -> Option<&PathwayOption> {
        self.pathway_options.get(index)
    }
}

/// The user's resolved choice from an active offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwaySelection {
    /// 0-based index into the offer
    pub pathway_index: usize,
    /// Minutes
    pub duration: u32,
    /// Share of unheard material, 0-100
    pub discovery_percentage: u8,
}

/// Body of a playlist generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub source_state: String,
    pub target_state: String,
    pub duration: u32,
    pub discovery_percentage: u8,
    pub spotify_user_id: Option<String>,
    pub spotify_access_token: Option<String>,
}

impl GenerationRequest {
    /// Build a request for `selection` out of `offer`; `None` if the index is stale
    pub fn from_selection(offer: &PathwayOffer, selection: &PathwaySelection) -> Option<Self> {
        let option = offer.get(selection.pathway_index)?;
        Some(Self {
            source_state: offer.detected_state.clone(),
            target_state: option.target_state.clone(),
            duration: selection.duration,
            discovery_percentage: selection.discovery_percentage,
            spotify_user_id: None,
            spotify_access_token: None,
        })
    }
}

/// Health of the automation backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub ok: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// "connected" | "disconnected" | "error"
    pub backend: String,
    /// "active" | "inactive" | "error" | "unknown"
    pub sms_workflow: String,
    pub current_state: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
