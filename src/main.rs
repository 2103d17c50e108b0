//! MuseShift CLI
//!
//! Usage:
//!   museshift                                # Interactive terminal
//!   museshift --dashboard --window week      # Poll and print dashboard snapshots
//!   museshift --checkins --limit 10 --json   # One-shot merged check-ins
//!   museshift --serve                        # HTTP + WebSocket API server

use anyhow::{anyhow, Context};
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use museshift::config::Config;
use museshift::core::{
    format_hour, format_time_ago, run_server, AppState, CheckinPipeline, Dashboard,
    DashboardSnapshot, FetchQuery, KvStore, MemoryStore, SessionLog, StateBackend, Terminal,
};
use museshift::types::{CanonicalCheckin, DataTab, EnergyState, Message, ReplyAction, TimeWindow};
use museshift::{DEFAULT_CHECKIN_LIMIT, POLL_INTERVAL_SECS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "museshift",
    version = VERSION,
    about = "MuseShift - energy-state check-ins, stats and pathway playlists",
    long_about = "MuseShift merges remote check-in tables and the local session log into\n\
                  one newest-first timeline and aggregates windowed stats.\n\n\
                  Modes:\n  \
                  (default)      Interactive terminal: describe a state, pick a pathway\n  \
                  --dashboard    Poll and print dashboard snapshots\n  \
                  --checkins     Print merged check-ins once\n  \
                  --serve        HTTP + WebSocket API server\n\n\
                  Pathway selection:\n  \
                  <n>[, <m> min][, <p>% | all new]   e.g. \"2, 45 min, 95% new\""
)]
struct Args {
    #[command(flatten)]
    config: Config,

    /// Poll remote or local data and print dashboard snapshots
    #[arg(short, long)]
    dashboard: bool,

    /// Print merged check-ins once and exit
    #[arg(short, long)]
    checkins: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Time window: today, week, month, all
    #[arg(long, default_value = "today")]
    window: TimeWindow,

    /// Data tab: live, local
    #[arg(long, default_value = "live")]
    tab: DataTab,

    /// Maximum check-ins for --checkins
    #[arg(long, default_value_t = DEFAULT_CHECKIN_LIMIT)]
    limit: usize,

    /// Only intake check-ins from this phone number
    #[arg(long)]
    phone: Option<String>,

    /// Dashboard refresh period in seconds
    #[arg(long, default_value_t = POLL_INTERVAL_SECS)]
    poll_secs: u64,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Keep the session log in memory only
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = args.config.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("museshift={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = args.config.validate() {
        error!("Configuration error: {}", e);
        return Err(anyhow!("configuration error: {}", e));
    }
    if args.no_color {
        colored::control::set_override(false);
    }

    let store: Arc<dyn KvStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        args.config.file_store()
    };
    let pipeline = CheckinPipeline::new(args.config.record_sources());
    let backend: Arc<dyn StateBackend> = Arc::new(args.config.backend());
    info!(
        remote = pipeline.is_configured(),
        webhook = %args.config.webhook_url,
        "Configured"
    );

    if args.serve {
        run_serve(&args, pipeline, backend, store).await
    } else if args.dashboard {
        run_dashboard(&args, pipeline, store).await
    } else if args.checkins {
        run_checkins(&args, pipeline).await
    } else {
        run_interactive(&args, backend, store).await
    }
}

/// Run the interactive terminal
async fn run_interactive(
    args: &Args,
    backend: Arc<dyn StateBackend>,
    store: Arc<dyn KvStore>,
) -> anyhow::Result<()> {
    let mut terminal = Terminal::new(
        backend,
        store,
        args.config.spotify_user_id.clone(),
        args.config.spotify_access_token.clone(),
    )
    .context("opening session store")?;

    print_header("Terminal", args.no_color);
    print_messages(&terminal.banner(), args.no_color);
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", format_prompt(&terminal, args.no_color));
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let reply = terminal.handle_line(line).await;
        if args.json {
            println!("{}", serde_json::to_string(&reply)?);
        } else {
            if reply.action == ReplyAction::ResetScreen {
                print!("\x1b[2J\x1b[H");
                print_header("Terminal", args.no_color);
            }
            print_messages(&reply.messages, args.no_color);
            println!();
        }
        if reply.action == ReplyAction::Logout {
            break;
        }
    }

    println!("\nSession ended.");
    Ok(())
}

/// Poll and print dashboard snapshots until Ctrl-C
async fn run_dashboard(
    args: &Args,
    pipeline: CheckinPipeline,
    store: Arc<dyn KvStore>,
) -> anyhow::Result<()> {
    let dashboard = Arc::new(
        Dashboard::new(pipeline, SessionLog::new(store)).with_phone(args.phone.clone()),
    );
    let period = Duration::from_secs(args.poll_secs.max(1));
    let (mut rx, handle) = dashboard.spawn_polling(period, args.window, args.tab);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                if args.json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                } else {
                    print_snapshot(&snapshot, args.no_color);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.abort();
    Ok(())
}

/// Print merged check-ins once
async fn run_checkins(args: &Args, pipeline: CheckinPipeline) -> anyhow::Result<()> {
    let query = FetchQuery {
        limit: args.limit,
        phone: args.phone.clone(),
    };
    let checkins = pipeline.fetch_checkins(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&checkins)?);
    } else {
        let now = chrono::Utc::now();
        for checkin in &checkins {
            println!("{}", format_checkin(checkin, now, args.no_color));
        }
        if checkins.is_empty() {
            println!("no check-ins");
        }
    }
    Ok(())
}

/// Run HTTP API server
async fn run_serve(
    args: &Args,
    pipeline: CheckinPipeline,
    backend: Arc<dyn StateBackend>,
    store: Arc<dyn KvStore>,
) -> anyhow::Result<()> {
    println!();
    println!("MuseShift API Server v{}", VERSION);
    println!();

    let dashboard = Arc::new(
        Dashboard::new(pipeline.clone(), SessionLog::new(store)).with_phone(args.phone.clone()),
    );
    let period = Duration::from_secs(args.poll_secs.max(1));
    let (snapshots, _poller) = Arc::clone(&dashboard).spawn_polling(period, args.window, args.tab);

    let state = Arc::new(AppState {
        pipeline,
        dashboard,
        backend,
        snapshots,
    });

    run_server(&args.addr, state)
        .await
        .map_err(|e| anyhow!("server error: {}", e))
}

/// Print header
fn print_header(mode: &str, no_color: bool) {
    let title = format!("MuseShift v{} - {}", VERSION, mode);
    if no_color {
        println!("========================================");
        println!("  {}", title);
        println!("========================================");
    } else {
        println!("{}", "========================================".bold());
        println!("  {}", title.bold());
        println!("{}", "========================================".bold());
    }
    println!();
}

fn print_messages(messages: &[Message], no_color: bool) {
    for message in messages {
        if no_color {
            println!("{}", message.to_parseable_string());
        } else {
            println!("{}", message.to_terminal_string());
        }
    }
}

/// Prompt shows the active offer size
fn format_prompt(terminal: &Terminal, no_color: bool) -> String {
    match terminal.offer() {
        Some(offer) if no_color => format!("[{} | {} pathways] > ", offer.detected_state, offer.len()),
        Some(offer) => {
            let (r, g, b) = EnergyState::rgb_for_label(Some(offer.detected_state.as_str()));
            format!(
                "{} > ",
                format!("[{} | {} pathways]", offer.detected_state, offer.len()).truecolor(r, g, b)
            )
        }
        None => "> ".to_string(),
    }
}

fn format_checkin(checkin: &CanonicalCheckin, now: chrono::DateTime<chrono::Utc>, no_color: bool) -> String {
    let state = checkin.detected_state.as_deref().unwrap_or("-");
    let mut line = format!(
        "{:>9}  {:<8} {:<12}",
        format_time_ago(checkin.timestamp, now),
        checkin.source.as_str(),
        state
    );
    if let Some(emotion) = &checkin.emotion {
        line.push_str(&format!(" ({})", emotion));
    }
    if let Some(feeling) = &checkin.feeling_text {
        line.push_str(&format!("  {}", feeling));
    }
    if no_color {
        line
    } else {
        let (r, g, b) = EnergyState::rgb_for_label(checkin.detected_state.as_deref());
        line.truecolor(r, g, b).to_string()
    }
}

/// Print one dashboard snapshot
fn print_snapshot(snapshot: &DashboardSnapshot, no_color: bool) {
    let stats = &snapshot.stats;
    let now = chrono::Utc::now();

    println!();
    println!(
        "=== {} | {} | refreshed {} ===",
        snapshot.tab,
        snapshot.window,
        snapshot.refreshed_at.with_timezone(&chrono::Local).format("%H:%M:%S")
    );
    if let Some(err) = &snapshot.error {
        let line = format!("error: {}", err);
        println!("{}", if no_color { line } else { line.red().to_string() });
        return;
    }

    println!("check-ins: {}", stats.total_checkins);
    if let Some(state) = &stats.dominant_state {
        println!("dominant state: {}", state);
    }
    if let Some(emotion) = &stats.dominant_emotion {
        println!("dominant emotion: {}", emotion);
    }
    if let Some(hour) = stats.peak_hour {
        println!("peak: {}", format_hour(hour));
    }
    for (source, count) in stats.source_breakdown() {
        println!("{}: {}", source, count);
    }

    let distribution = stats.state_distribution();
    if !distribution.is_empty() {
        println!("\nstates:");
        for (state, count, pct) in distribution {
            let line = format!("  {:<12} {:>3}  {:>3}%", state, count, pct);
            if no_color {
                println!("{}", line);
            } else {
                let (r, g, b) = EnergyState::rgb_for_label(Some(state.as_str()));
                println!("{}", line.truecolor(r, g, b));
            }
        }
    }

    let histogram = stats.hour_histogram();
    let max = histogram.iter().copied().max().unwrap_or(0).max(1);
    println!("\nhours:");
    for (hour, count) in histogram.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let bar = "#".repeat((count * 20).div_ceil(max));
        println!("  {:>4} {:<20} {}", format_hour(hour as u32), bar, count);
    }

    if !snapshot.checkins.is_empty() {
        println!("\nlatest:");
        for checkin in &snapshot.checkins {
            println!("  {}", format_checkin(checkin, now, no_color));
        }
    }
    if !snapshot.sessions.is_empty() {
        println!("\nlocal sessions:");
        for session in &snapshot.sessions {
            let what = match (session.detected_state(), session.target_state()) {
                (Some(state), _) => format!("detected {}", state),
                (None, Some(target)) => format!("playlist -> {}", target),
                (None, None) => "-".to_string(),
            };
            println!("  {:>9}  {}", format_time_ago(session.timestamp, now), what);
        }
    }
}
