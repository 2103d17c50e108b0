//! Check-in pipeline: adapters -> normalizer -> merge & rank

use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::merge::merge_and_rank;
use crate::core::normalizer::normalize;
use crate::core::sources::{fetch_all, FetchQuery, RecordSource};
use crate::error::{Error, Result};
use crate::types::{CanonicalCheckin, TaggedRecord};

#[derive(Clone)]
pub struct CheckinPipeline {
    sources: Vec<Arc<dyn RecordSource>>,
}

impl CheckinPipeline {
    pub fn new(sources: Vec<Arc<dyn RecordSource>>) -> Self {
        Self { sources }
    }

    pub fn is_configured(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Newest-first check-ins across every source, at most `query.limit`
    ///
    /// Fails only when no source answered; malformed rows are dropped.
    pub async fn fetch_checkins(&self, query: &FetchQuery) -> Result<Vec<CanonicalCheckin>> {
        let batches = fetch_all(&self.sources, query).await?;
        let normalized: Vec<Vec<CanonicalCheckin>> =
            batches.iter().map(|batch| normalize_batch(batch)).collect();

        let checkins = merge_and_rank(normalized, query.limit);
        debug!(count = checkins.len(), limit = query.limit, "Merged check-ins");
        Ok(checkins)
    }
}

/// Normalize one source's rows, skipping the ones that cannot be resolved
pub fn normalize_batch(batch: &[TaggedRecord]) -> Vec<CanonicalCheckin> {
    batch
        .iter()
        .filter_map(|tagged| match normalize(tagged) {
            Ok(checkin) => Some(checkin),
            Err(Error::MalformedRecord { id, reason }) => {
                warn!(
                    source = %tagged.tag,
                    id = id.as_deref().unwrap_or("-"),
                    code = reason.code(),
                    "Dropping malformed record"
                );
                None
            }
            Err(e) => {
                warn!(source = %tagged.tag, error = %e, "Dropping record");
                None
            }
        })
        .collect()
}
