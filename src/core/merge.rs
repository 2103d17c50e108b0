//! Merge & rank: combine per-source check-ins into one newest-first sequence
//!
//! Truncation happens after the global sort so the result is the top N across
//! all sources, never N per source. No cross-source dedup: ids from different
//! tables are not comparable.

use crate::types::CanonicalCheckin;

/// Merge all batches, sort newest first (stable), keep at most `limit`
pub fn merge_and_rank<I>(batches: I, limit: usize) -> Vec<CanonicalCheckin>
where
    I: IntoIterator<Item = Vec<CanonicalCheckin>>,
{
    let mut merged: Vec<CanonicalCheckin> = batches.into_iter().flatten().collect();
    // sort_by is stable: equal timestamps keep input order
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(limit);
    merged
}

/// True if the sequence is non-increasing by timestamp
pub fn is_ranked(checkins: &[CanonicalCheckin]) -> bool {
    checkins.windows(2).all(|w| w[0].timestamp >= w[1].timestamp)
}
