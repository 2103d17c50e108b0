//! Stats aggregator: frequency tables, dominant values and the hourly histogram
//!
//! Windows are anchored at local midnight of "now":
//! - today: >= midnight
//! - week:  >= midnight - 7 days
//! - month: >= midnight - 1 calendar month
//! - all:   no filter
//!
//! Ties for dominant state/emotion go to the label seen first in record order;
//! ties for peak hour go to the earliest hour.

use chrono::{DateTime, Local, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use indexmap::IndexMap;

use crate::types::{LocalSession, Observation, Stats, TimeWindow};

/// Start of `window` relative to `now`, or `None` for no lower bound
pub fn window_start<Tz: TimeZone>(window: TimeWindow, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let start_day = match window {
        TimeWindow::Today => today,
        TimeWindow::Week => today - chrono::Duration::days(7),
        TimeWindow::Month => today.checked_sub_months(Months::new(1))?,
        TimeWindow::All => return None,
    };
    Some(local_midnight(&now.timezone(), start_day))
}

const QUARTER_HOURS_PER_DAY: i64 = 96;

/// Midnight of `day` in `tz`, as UTC
///
/// When a DST jump skips midnight this is the first valid local instant of `day`.
/// Candidates are tried in quarter-hour steps.
fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    (0..QUARTER_HOURS_PER_DAY)
        .map(|q| midnight + chrono::Duration::minutes(15 * q))
        .find_map(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Records inside `window`, order preserved
pub fn filter_window<'a, T, Tz>(records: &'a [T], window: TimeWindow, now: &DateTime<Tz>) -> Vec<&'a T>
where
    T: Observation,
    Tz: TimeZone,
{
    match window_start(window, now) {
        Some(start) => records.iter().filter(|r| r.observed_at() >= start).collect(),
        None => records.iter().collect(),
    }
}

/// Stats aggregator
#[derive(Debug, Default)]
pub struct StatsAggregator;

impl StatsAggregator {
    /// Create new aggregator
    pub fn new() -> Self {
        Self
    }

    /// Compute stats against the system clock and local time zone
    pub fn compute<T: Observation>(&self, records: &[T], window: TimeWindow) -> Stats {
        self.compute_at(records, window, &Local::now())
    }

    /// Compute stats for an explicit "now"; hours are bucketed in `now`'s zone
    pub fn compute_at<T, Tz>(&self, records: &[T], window: TimeWindow, now: &DateTime<Tz>) -> Stats
    where
        T: Observation,
        Tz: TimeZone,
    {
        let filtered = filter_window(records, window, now);
        self.aggregate(&filtered, &now.timezone())
    }

    /// Aggregate already-filtered records
    pub fn aggregate<T, Tz>(&self, records: &[&T], tz: &Tz) -> Stats
    where
        T: Observation,
        Tz: TimeZone,
    {
        let mut stats = Stats {
            total_checkins: records.len(),
            ..Stats::default()
        };

        for record in records {
            if let Some(state) = record.state_label().map(str::trim).filter(|s| !s.is_empty()) {
                *stats.state_counts.entry(state.to_lowercase()).or_insert(0) += 1;
            }
            if let Some(emotion) = record.emotion_label().filter(|s| !s.is_empty()) {
                *stats.emotion_counts.entry(emotion.to_string()).or_insert(0) += 1;
            }
            *stats
                .source_counts
                .entry(record.source().as_str().to_string())
                .or_insert(0) += 1;

            let hour = record.observed_at().with_timezone(tz).hour();
            *stats.hour_counts.entry(hour).or_insert(0) += 1;
        }

        stats.dominant_state = dominant(&stats.state_counts);
        stats.dominant_emotion = dominant(&stats.emotion_counts);
        stats.peak_hour = stats
            .hour_counts
            .iter()
            .fold(None, |best: Option<(u32, usize)>, (hour, count)| match best {
                Some((_, top)) if *count <= top => best,
                _ => Some((*hour, *count)),
            })
            .map(|(hour, _)| hour);

        stats
    }
}

/// Highest-count label; first inserted wins ties
fn dominant(counts: &IndexMap<String, usize>) -> Option<String> {
    let mut entries: Vec<(&String, &usize)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries.first().map(|(label, _)| (*label).clone())
}

/// Today's local activity, as shown by the terminal `stats` command
#[derive(Debug, Clone, PartialEq)]
pub struct TodaySummary {
    pub date: NaiveDate,
    /// Detection events today
    pub state_checks: usize,
    /// Generation events today
    pub playlists: usize,
    /// Detected states in log order
    pub states: Vec<String>,
    pub stats: Stats,
}

impl TodaySummary {
    pub fn last_state(&self) -> Option<&str> {
        self.states.last().map(String::as_str)
    }
}

/// Summarize today's local sessions
pub fn today_summary<Tz: TimeZone>(sessions: &[LocalSession], now: &DateTime<Tz>) -> TodaySummary {
    let today = filter_window(sessions, TimeWindow::Today, now);
    let states: Vec<String> = today
        .iter()
        .filter_map(|s| s.detected_state().map(str::to_string))
        .collect();
    let playlists = today.iter().filter(|s| s.is_playlist()).count();
    let stats = StatsAggregator::new().aggregate(&today, &now.timezone());

    TodaySummary {
        date: now.date_naive(),
        state_checks: states.len(),
        playlists,
        states,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalCheckin, CheckinSource};
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap()
    }

    fn checkin(id: &str, ts: DateTime<Utc>, state: Option<&str>) -> CanonicalCheckin {
        let mut c = CanonicalCheckin::new(id, ts, CheckinSource::Sms);
        c.detected_state = state.map(str::to_string);
        c
    }

    #[test]
    fn test_window_start_month_uses_calendar_arithmetic() {
        let start = window_start(TimeWindow::Month, &now()).unwrap();
        // March 31 minus one month clamps to Feb 29 (leap year)
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_window_start_respects_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = now().with_timezone(&tz);
        let start = window_start(TimeWindow::Today, &local_now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 30, 22, 0, 0).unwrap());
        assert!(window_start(TimeWindow::All, &local_now).is_none());
    }

    #[test]
    fn test_skipped_midnight_starts_at_first_valid_instant() {
        use chrono_tz::America::Santiago;

        // Chile springs forward at local midnight on 2024-09-08 (00:00 -> 01:00)
        let local_now = Santiago.with_ymd_and_hms(2024, 9, 8, 12, 0, 0).unwrap();
        let start = window_start(TimeWindow::Today, &local_now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());

        let records = vec![
            checkin("late", Utc.with_ymd_and_hms(2024, 9, 8, 2, 30, 0).unwrap(), Some("lowline")),
            checkin("early", Utc.with_ymd_and_hms(2024, 9, 8, 4, 30, 0).unwrap(), Some("voltage")),
        ];
        let today: Vec<&str> = filter_window(&records, TimeWindow::Today, &local_now)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(today, vec!["early"]);
    }

    #[test]
    fn test_dominant_tie_goes_to_first_seen() {
        let records = vec![
            checkin("1", now(), Some("lowline")),
            checkin("2", now(), Some("voltage")),
            checkin("3", now(), Some("Voltage")),
            checkin("4", now(), Some("LOWLINE")),
        ];
        let stats = StatsAggregator::new().compute_at(&records, TimeWindow::All, &now());
        assert_eq!(stats.dominant_state.as_deref(), Some("lowline"));
        assert_eq!(stats.state_counts.len(), 2);
    }

    #[test]
    fn test_peak_hour_tie_goes_to_earliest_hour() {
        let records = vec![
            checkin("1", Utc.with_ymd_and_hms(2024, 3, 31, 14, 0, 0).unwrap(), None),
            checkin("2", Utc.with_ymd_and_hms(2024, 3, 31, 9, 0, 0).unwrap(), None),
        ];
        let stats = StatsAggregator::new().compute_at(&records, TimeWindow::All, &now());
        assert_eq!(stats.peak_hour, Some(9));
    }

    #[test]
    fn test_hours_bucket_in_local_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let records = vec![checkin("1", Utc.with_ymd_and_hms(2024, 3, 31, 3, 0, 0).unwrap(), None)];
        let stats = StatsAggregator::new().compute_at(&records, TimeWindow::All, &now().with_timezone(&tz));
        assert_eq!(stats.hour_counts.get(&22), Some(&1));
    }

    #[test]
    fn test_source_counts() {
        let mut personal = checkin("p", now(), None);
        personal.source = CheckinSource::Personal;
        let records = vec![checkin("s", now(), None), personal];
        let stats = StatsAggregator::new().compute_at(&records, TimeWindow::All, &now());
        assert_eq!(stats.source_count("sms"), 1);
        assert_eq!(stats.source_count("personal"), 1);
        assert_eq!(stats.source_count("intake"), 0);
    }
}
