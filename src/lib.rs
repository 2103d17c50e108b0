//! MuseShift: energy-state check-in engine
//!
//! Remote check-in tables and the local session log are normalized into one
//! canonical shape, merged newest-first and aggregated into windowed stats.
//! Terminal input is parsed into commands or pathway selections.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use error::{Error, Result};

// =============================================================================
// PATHWAY SELECTION DEFAULTS
// =============================================================================

/// Playlist length when a selection names no duration (minutes)
pub const DEFAULT_DURATION_MIN: u32 = 40;

/// Discovery share when a selection names none (percent)
pub const DEFAULT_DISCOVERY_PCT: u8 = 90;

// =============================================================================
// FETCH / DASHBOARD
// =============================================================================

/// Rows requested per source when no limit is given
pub const DEFAULT_CHECKIN_LIMIT: usize = 20;

/// Rows requested per source by the dashboard
pub const DASHBOARD_CHECKIN_LIMIT: usize = 50;

/// Dashboard refresh period
pub const POLL_INTERVAL_SECS: u64 = 30;

/// Check-ins listed on the live tab
pub const LATEST_CHECKINS_SHOWN: usize = 10;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
