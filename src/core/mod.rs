//! Core modules for MuseShift

pub mod sources;
pub mod normalizer;
pub mod merge;
pub mod stats;
pub mod command;
pub mod store;
pub mod session_log;
pub mod backend;
pub mod pipeline;
pub mod dashboard;
pub mod terminal;
pub mod api;

pub use sources::{fetch_all, AirtableConfig, AirtableSource, FetchQuery, RecordSource};
pub use normalizer::{extract_emotion, normalize, parse_timestamp, FieldMap};
pub use merge::{is_ranked, merge_and_rank};
pub use stats::{filter_window, today_summary, window_start, StatsAggregator, TodaySummary};
pub use command::CommandParser;
pub use store::{FileStore, KvStore, MemoryStore, TOKEN_KEY};
pub use session_log::{SessionLog, SESSIONS_KEY};
pub use backend::{StateBackend, WebhookBackend};
pub use pipeline::{normalize_batch, CheckinPipeline};
pub use dashboard::{format_hour, format_time_ago, user_facing, Dashboard, DashboardSnapshot};
pub use terminal::Terminal;
pub use api::{create_router, run_server, AppState};
