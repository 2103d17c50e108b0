//! Configuration for MuseShift
//!
//! CLI arguments and environment variables via clap; a `.env` file is
//! loaded by the binary before parsing.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{AirtableConfig, AirtableSource, FileStore, KvStore, RecordSource, WebhookBackend};
use crate::types::SourceTag;

/// Remote tables, backend and local storage settings
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Airtable personal access token; without it the live tab is unavailable
    #[arg(long, env = "AIRTABLE_API_KEY", hide_env_values = true)]
    pub airtable_api_key: Option<String>,

    /// Airtable base id
    #[arg(long, env = "AIRTABLE_BASE_ID", default_value = "appscTrH12aw6CMQr")]
    pub airtable_base_id: String,

    /// Intake (SMS) check-in table id
    #[arg(long, env = "INTAKE_TABLE_ID", default_value = "tblrvW64Kt0rXyWd2")]
    pub intake_table_id: String,

    /// Personal check-in table id
    #[arg(long, env = "PERSONAL_TABLE_ID", default_value = "tbl7KQgWwit30MmGX")]
    pub personal_table_id: String,

    #[arg(long, env = "AIRTABLE_API_URL", default_value = "https://api.airtable.com/v0")]
    pub airtable_api_url: String,

    /// Base URL of the detection / generation webhooks
    #[arg(long, env = "WEBHOOK_URL", default_value = "http://localhost:5678/webhook")]
    pub webhook_url: String,

    /// Music account id passed through to generation
    #[arg(long, env = "SPOTIFY_USER_ID")]
    pub spotify_user_id: Option<String>,

    /// Music access token passed through to generation
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub spotify_access_token: Option<String>,

    /// Directory for the local session log and stored credentials
    #[arg(long, env = "MUSESHIFT_DATA_DIR", default_value = "./.museshift")]
    pub data_dir: PathBuf,

    /// Timeout for every outbound request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "15")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.airtable_base_id.trim().is_empty() {
            return Err("AIRTABLE_BASE_ID must not be empty".to_string());
        }
        if self.intake_table_id.trim().is_empty() || self.personal_table_id.trim().is_empty() {
            return Err("INTAKE_TABLE_ID and PERSONAL_TABLE_ID must not be empty".to_string());
        }
        if self.webhook_url.trim().is_empty() {
            return Err("WEBHOOK_URL must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be greater than zero".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Intake and personal table adapters; empty when no API key is set
    pub fn record_sources(&self) -> Vec<Arc<dyn RecordSource>> {
        let Some(api_key) = self.airtable_api_key.clone().filter(|k| !k.is_empty()) else {
            return Vec::new();
        };

        [
            (SourceTag::Intake, &self.intake_table_id),
            (SourceTag::Personal, &self.personal_table_id),
        ]
        .into_iter()
        .map(|(tag, table_id)| {
            let source = AirtableSource::new(
                tag,
                AirtableConfig {
                    api_url: self.airtable_api_url.clone(),
                    api_key: api_key.clone(),
                    base_id: self.airtable_base_id.clone(),
                    table_id: table_id.clone(),
                    timeout: self.request_timeout(),
                },
            );
            Arc::new(source) as Arc<dyn RecordSource>
        })
        .collect()
    }

    pub fn backend(&self) -> WebhookBackend {
        WebhookBackend::new(self.webhook_url.clone(), self.request_timeout())
    }

    pub fn file_store(&self) -> Arc<dyn KvStore> {
        Arc::new(FileStore::new(self.data_dir.clone()))
    }
}
