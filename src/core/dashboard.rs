//! Dashboard: periodic fetch-merge-aggregate over the live or local data set
//!
//! Polling is a single task on a fixed interval publishing into a watch
//! channel. Cycles run one after another, so a slow fetch delays the next
//! cycle instead of racing it.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::core::pipeline::CheckinPipeline;
use crate::core::session_log::SessionLog;
use crate::core::sources::FetchQuery;
use crate::core::stats::{filter_window, StatsAggregator};
use crate::error::Error;
use crate::types::{CanonicalCheckin, DataTab, LocalSession, Stats, TimeWindow};
use crate::{DASHBOARD_CHECKIN_LIMIT, DEFAULT_CHECKIN_LIMIT, LATEST_CHECKINS_SHOWN};

/// One rendered state of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub refreshed_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub tab: DataTab,
    /// Latest windowed remote check-ins (live tab)
    pub checkins: Vec<CanonicalCheckin>,
    /// Latest local sessions, newest first (local tab)
    pub sessions: Vec<LocalSession>,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardSnapshot {
    pub fn empty(window: TimeWindow, tab: DataTab, now: DateTime<Utc>) -> Self {
        Self {
            refreshed_at: now,
            window,
            tab,
            checkins: Vec::new(),
            sessions: Vec::new(),
            stats: Stats::default(),
            error: None,
        }
    }

    fn failed(window: TimeWindow, tab: DataTab, now: DateTime<Utc>, error: &Error) -> Self {
        Self {
            error: Some(user_facing(error)),
            ..Self::empty(window, tab, now)
        }
    }
}

/// Error text shown on the dashboard and returned by the API
pub fn user_facing(error: &Error) -> String {
    match error {
        Error::NotConfigured(_) => "Airtable not configured".to_string(),
        Error::AllSourcesUnavailable { .. } => "Failed to fetch check-ins".to_string(),
        other => other.to_string(),
    }
}

pub struct Dashboard {
    pipeline: CheckinPipeline,
    log: SessionLog,
    phone: Option<String>,
    aggregator: StatsAggregator,
}

impl Dashboard {
    pub fn new(pipeline: CheckinPipeline, log: SessionLog) -> Self {
        Self {
            pipeline,
            log,
            phone: None,
            aggregator: StatsAggregator::new(),
        }
    }

    /// Restrict the live tab to one phone number
    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone.filter(|p| !p.is_empty());
        self
    }

    pub async fn refresh(&self, window: TimeWindow, tab: DataTab) -> DashboardSnapshot {
        self.refresh_at(window, tab, &Local::now()).await
    }

    /// Refresh against an explicit "now"
    pub async fn refresh_at<Tz>(&self, window: TimeWindow, tab: DataTab, now: &DateTime<Tz>) -> DashboardSnapshot
    where
        Tz: TimeZone,
        Tz::Offset: Send + Sync,
    {
        let refreshed_at = now.with_timezone(&Utc);
        match tab {
            DataTab::Live => {
                let query = FetchQuery {
                    limit: DASHBOARD_CHECKIN_LIMIT,
                    phone: self.phone.clone(),
                };
                match self.pipeline.fetch_checkins(&query).await {
                    Ok(checkins) => {
                        let stats = self.aggregator.compute_at(&checkins, window, now);
                        let latest = filter_window(&checkins, window, now)
                            .into_iter()
                            .take(LATEST_CHECKINS_SHOWN)
                            .cloned()
                            .collect();
                        DashboardSnapshot {
                            checkins: latest,
                            stats,
                            ..DashboardSnapshot::empty(window, tab, refreshed_at)
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Live refresh failed");
                        DashboardSnapshot::failed(window, tab, refreshed_at, &e)
                    }
                }
            }
            DataTab::Local => match self.log.load() {
                Ok(sessions) => {
                    let stats = self.aggregator.compute_at(&sessions, window, now);
                    let latest = sessions.into_iter().rev().take(DEFAULT_CHECKIN_LIMIT).collect();
                    DashboardSnapshot {
                        sessions: latest,
                        stats,
                        ..DashboardSnapshot::empty(window, tab, refreshed_at)
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Local refresh failed");
                    DashboardSnapshot::failed(window, tab, refreshed_at, &e)
                }
            },
        }
    }

    /// Refresh every `period` until every receiver is dropped
    pub fn spawn_polling(
        self: Arc<Self>,
        period: Duration,
        window: TimeWindow,
        tab: DataTab,
    ) -> (watch::Receiver<DashboardSnapshot>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(DashboardSnapshot::empty(window, tab, Utc::now()));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut cycle: u64 = 0;

            loop {
                ticker.tick().await;
                cycle += 1;
                let snapshot = self.refresh(window, tab).await;
                debug!(
                    cycle,
                    total = snapshot.stats.total_checkins,
                    failed = snapshot.error.is_some(),
                    "Poll cycle"
                );
                if tx.send(snapshot).is_err() {
                    debug!("No dashboard subscribers left, stopping poll");
                    break;
                }
            }
        });

        (rx, handle)
    }
}

/// `0` -> `12AM`, `13` -> `1PM`
pub fn format_hour(hour: u32) -> String {
    let h = match hour % 12 {
        0 => 12,
        h => h,
    };
    let suffix = if hour % 24 < 12 { "AM" } else { "PM" };
    format!("{}{}", h, suffix)
}

/// Coarse relative age: `just now`, `5m ago`, `3h ago`, `2d ago`
pub fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let mins = elapsed.num_minutes();
    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{}m ago", mins)
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}
