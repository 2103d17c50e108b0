//! Record source adapters
//!
//! Each adapter fetches raw rows from one remote table and tags them with
//! that table's identity. `fetch_all` fans out to every source at once; a
//! failing source contributes nothing, and only a failure of every source is
//! reported as an error.

use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{RawRecord, RecordPage, SourceTag, TaggedRecord};
use crate::DEFAULT_CHECKIN_LIMIT;

/// Parameters for one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    /// Maximum rows per source
    pub limit: usize,
    /// Exact-match phone filter, honoured only by sources that support it
    pub phone: Option<String>,
}

impl Default for FetchQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CHECKIN_LIMIT,
            phone: None,
        }
    }
}

impl FetchQuery {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit, phone: None }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A remote table of check-in rows
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// Fetch raw rows, newest first. Any failure is `SourceUnavailable`.
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawRecord>>;
}

/// Configuration for an Airtable-shaped table
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_url: String,
    pub api_key: String,
    pub base_id: String,
    pub table_id: String,
    pub timeout: Duration,
}

/// HTTP client with the crate user agent and a per-request timeout
///
/// Falls back to reqwest defaults (with a warning) if the builder rejects the settings.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("museshift/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, ?timeout, "HTTP client settings rejected, using defaults without timeout");
            reqwest::Client::new()
        }
    }
}

/// Adapter for one Airtable table
pub struct AirtableSource {
    tag: SourceTag,
    config: AirtableConfig,
    http_client: reqwest::Client,
}

impl AirtableSource {
    pub fn new(tag: SourceTag, config: AirtableConfig) -> Self {
        let http_client = http_client(config.timeout);
        Self { tag, config, http_client }
    }

    /// Table listing URL
    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.base_id,
            self.config.table_id
        )
    }

    /// Query parameters for `query`; the phone filter applies to the intake table only
    pub fn query_params(&self, query: &FetchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("maxRecords", query.limit.to_string()),
            ("sort[0][field]", "Created".to_string()),
            ("sort[0][direction]", "desc".to_string()),
        ];
        if self.tag == SourceTag::Intake {
            if let Some(phone) = query.phone.as_deref().filter(|p| !p.is_empty()) {
                params.push(("filterByFormula", phone_formula(phone)));
            }
        }
        params
    }

    fn unavailable(&self, reason: impl Into<String>) -> Error {
        Error::SourceUnavailable {
            source_name: self.tag.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RecordSource for AirtableSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawRecord>> {
        let url = self.url();
        debug!(source = %self.tag, url = %url, limit = query.limit, "Fetching records");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.unavailable(format!("HTTP {}", response.status())));
        }

        let page: RecordPage = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("invalid body: {}", e)))?;

        Ok(page.records)
    }
}

/// `{from_number}="<phone>"` with quotes and backslashes escaped
pub fn phone_formula(phone: &str) -> String {
    let escaped = phone.replace('\\', "\\\\").replace('"', "\\\"");
    format!("{{from_number}}=\"{}\"", escaped)
}

/// Fetch from every source concurrently
///
/// Returns one batch per source that answered, in `sources` order. Failed
/// sources are logged and skipped; if all fail, `AllSourcesUnavailable`.
pub async fn fetch_all(
    sources: &[Arc<dyn RecordSource>],
    query: &FetchQuery,
) -> Result<Vec<Vec<TaggedRecord>>> {
    if sources.is_empty() {
        return Err(Error::NotConfigured("no record sources".to_string()));
    }

    let started = Instant::now();
    let results = join_all(sources.iter().map(|source| async move {
        let tag = source.tag();
        (tag, source.fetch(query).await)
    }))
    .await;

    let mut batches = Vec::with_capacity(results.len());
    for (tag, result) in results {
        match result {
            Ok(records) => {
                debug!(source = %tag, count = records.len(), "Source answered");
                batches.push(
                    records
                        .into_iter()
                        .map(|record| TaggedRecord::new(tag, record))
                        .collect(),
                );
            }
            Err(e) => {
                warn!(source = %tag, error = %e, "Source unavailable, continuing without it");
            }
        }
    }

    if batches.is_empty() {
        warn!(attempted = sources.len(), "All record sources unavailable");
        return Err(Error::AllSourcesUnavailable {
            attempted: sources.len(),
        });
    }

    debug!(
        sources = batches.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fetch complete"
    );
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tag: SourceTag) -> AirtableSource {
        AirtableSource::new(
            tag,
            AirtableConfig {
                api_url: "https://api.airtable.com/v0/".into(),
                api_key: "key".into(),
                base_id: "appBase".into(),
                table_id: "tblTable".into(),
                timeout: Duration::from_secs(1),
            },
        )
    }

    #[test]
    fn test_url() {
        assert_eq!(
            source(SourceTag::Intake).url(),
            "https://api.airtable.com/v0/appBase/tblTable"
        );
    }

    #[test]
    fn test_phone_filter_only_on_intake() {
        let query = FetchQuery::with_limit(5).phone("+15551234");
        let intake = source(SourceTag::Intake).query_params(&query);
        assert!(intake
            .iter()
            .any(|(k, v)| *k == "filterByFormula" && v == "{from_number}=\"+15551234\""));
        assert!(intake.iter().any(|(k, v)| *k == "maxRecords" && v == "5"));

        let personal = source(SourceTag::Personal).query_params(&query);
        assert!(!personal.iter().any(|(k, _)| *k == "filterByFormula"));
    }

    #[test]
    fn test_phone_formula_escapes_quotes() {
        assert_eq!(phone_formula(r#"1"2"#), r#"{from_number}="1\"2""#);
    }
}
