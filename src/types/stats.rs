//! Stats snapshot and dashboard selectors

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Time window applied before aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    Today,
    Week,
    Month,
    All,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Today => "today",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::All => "all",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(TimeWindow::Today),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            "all" => Ok(TimeWindow::All),
            other => Err(format!("unknown time window '{}'", other)),
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which record set the dashboard aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataTab {
    /// Remote check-in tables
    #[default]
    #[serde(alias = "live-remote")]
    Live,
    /// Local session log
    Local,
}

impl FromStr for DataTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "live-remote" | "remote" => Ok(DataTab::Live),
            "local" => Ok(DataTab::Local),
            other => Err(format!("unknown data tab '{}'", other)),
        }
    }
}

impl std::fmt::Display for DataTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataTab::Live => f.write_str("live"),
            DataTab::Local => f.write_str("local"),
        }
    }
}

/// Derived statistics over a windowed record set; recomputed on demand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_checkins: usize,
    /// Lower-cased state label -> count, in first-seen order
    pub state_counts: IndexMap<String, usize>,
    pub emotion_counts: IndexMap<String, usize>,
    pub source_counts: IndexMap<String, usize>,
    pub dominant_state: Option<String>,
    pub dominant_emotion: Option<String>,
    /// Sparse hour-of-day histogram (local time)
    pub hour_counts: BTreeMap<u32, usize>,
    pub peak_hour: Option<u32>,
}

impl Stats {
    /// Share of `count` in the window, rounded; 0 when the window is empty
    pub fn percentage(&self, count: usize) -> u32 {
        if self.total_checkins == 0 {
            return 0;
        }
        ((count as f64 / self.total_checkins as f64) * 100.0).round() as u32
    }

    /// Dense 24-bucket view of `hour_counts`
    pub fn hour_histogram(&self) -> [usize; 24] {
        let mut buckets = [0usize; 24];
        for (hour, count) in &self.hour_counts {
            if let Some(slot) = buckets.get_mut(*hour as usize) {
                *slot = *count;
            }
        }
        buckets
    }

    /// States by descending count with their percentage; ties keep first-seen order
    pub fn state_distribution(&self) -> Vec<(String, usize, u32)> {
        let mut entries: Vec<(String, usize)> = self
            .state_counts
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
            .into_iter()
            .map(|(state, count)| {
                let pct = self.percentage(count);
                (state, count, pct)
            })
            .collect()
    }

    pub fn source_count(&self, source: &str) -> usize {
        self.source_counts.get(source).copied().unwrap_or(0)
    }

    /// Every source bucket with a non-zero count, in first-seen order
    pub fn source_breakdown(&self) -> Vec<(&str, usize)> {
        self.source_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(source, count)| (source.as_str(), *count))
            .collect()
    }
}
