//! Terminal session controller
//!
//! Owns the active pathway offer and turns each input line into a `Reply`.
//! The offer is dropped on a successful generation or `clear`, and survives
//! every failure so the user can retry.

use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::backend::StateBackend;
use crate::core::command::CommandParser;
use crate::core::session_log::SessionLog;
use crate::core::stats::today_summary;
use crate::core::store::{KvStore, TOKEN_KEY};
use crate::error::{Error, Result};
use crate::types::{
    BareCommand, EnergyState, GenerationRequest, Message, MessageKind, ParsedInput, PathwayOffer,
    PathwaySelection, Reply, ReplyAction, SessionEvent,
};

pub struct Terminal {
    backend: Arc<dyn StateBackend>,
    log: SessionLog,
    store: Arc<dyn KvStore>,
    parser: CommandParser,
    offer: Option<PathwayOffer>,
    user_id: Option<String>,
    access_token: Option<String>,
}

impl Terminal {
    /// Create a terminal; a given access token is remembered in `store`
    pub fn new(
        backend: Arc<dyn StateBackend>,
        store: Arc<dyn KvStore>,
        user_id: Option<String>,
        access_token: Option<String>,
    ) -> Result<Self> {
        let access_token = match access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                store.set(TOKEN_KEY, &token)?;
                Some(token)
            }
            None => store.get(TOKEN_KEY)?,
        };

        Ok(Self {
            backend,
            log: SessionLog::new(Arc::clone(&store)),
            store,
            parser: CommandParser::new(),
            offer: None,
            user_id,
            access_token,
        })
    }

    pub fn offer(&self) -> Option<&PathwayOffer> {
        self.offer.as_ref()
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    /// Greeting shown at start and after `clear`
    pub fn banner(&self) -> Vec<Message> {
        let mut lines = vec![Message::system("MUSESHIFT PERSONAL PROTOCOL ONLINE")];
        if let Some(user) = &self.user_id {
            lines.push(Message::system(format!("connected as: {}", user)));
        }
        lines.push(Message::system("describe your state or type 'help' for commands"));

        match self.log.load() {
            Ok(sessions) => {
                let today = today_summary(&sessions, &Local::now());
                lines.push(Message::system(format!(
                    "today: {} state checks | {} playlists",
                    today.state_checks, today.playlists
                )));
            }
            Err(e) => warn!(error = %e, "Could not read session log for banner"),
        }
        lines
    }

    /// Handle one line of input
    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let line = line.trim();
        if line.is_empty() {
            return Reply::default();
        }

        match self.parser.parse(line, self.offer.as_ref()) {
            Ok(ParsedInput::Command(cmd)) => self.run_command(cmd),
            Ok(ParsedInput::Select(selection)) => self.generate(line, selection).await,
            Ok(ParsedInput::Describe(text)) => self.detect(&text).await,
            Err(Error::PathwayIndexOutOfRange { index, available }) => {
                debug!(index, available, "Rejected pathway selection");
                Reply::new(vec![Message::user(line), Message::error("INVALID PATHWAY NUMBER")])
            }
            Err(e) => Reply::new(vec![Message::user(line), Message::error(e.to_string())]),
        }
    }

    fn run_command(&mut self, cmd: BareCommand) -> Reply {
        match cmd {
            BareCommand::Help => Reply::new(vec![
                Message::system("COMMANDS:"),
                Message::system("• describe your state (freeform text)"),
                Message::system("• \"stats\" - view your daily patterns"),
                Message::system("• \"clear\" - reset conversation"),
                Message::system("• \"logout\" - disconnect Spotify"),
            ]),
            BareCommand::Stats => self.stats(),
            BareCommand::Clear => {
                self.offer = None;
                match self.log.clear() {
                    Ok(()) => Reply::new(self.banner()).with_action(ReplyAction::ResetScreen),
                    Err(e) => Reply::new(vec![Message::error(format!("CLEAR FAILED: {}", e))]),
                }
            }
            BareCommand::Logout => {
                self.access_token = None;
                self.offer = None;
                if let Err(e) = self.store.remove(TOKEN_KEY) {
                    warn!(error = %e, "Could not remove stored token");
                }
                Reply::new(vec![Message::system("disconnected")]).with_action(ReplyAction::Logout)
            }
        }
    }

    fn stats(&self) -> Reply {
        let sessions = match self.log.load() {
            Ok(sessions) => sessions,
            Err(e) => return Reply::new(vec![Message::error(format!("STATS UNAVAILABLE: {}", e))]),
        };
        let now = Local::now();
        let today = today_summary(&sessions, &now);

        let mut messages = vec![
            Message::system(format!("\n=== TODAY'S STATS ({}) ===", today.date.format("%a %b %d %Y"))),
            Message::system(format!("State checks: {}", today.state_checks)),
            Message::system(format!("Playlists generated: {}", today.playlists)),
        ];

        if !today.stats.state_counts.is_empty() {
            messages.push(Message::system("\nState breakdown:"));
            for (state, count) in &today.stats.state_counts {
                messages.push(
                    Message::new(MessageKind::State, format!("  {}: {}x", state, count)).with_state(state.as_str()),
                );
            }
        }
        Reply::new(messages)
    }

    async fn detect(&mut self, text: &str) -> Reply {
        let mut messages = vec![Message::user(text)];

        let offer = match self.backend.detect(text).await {
            Ok(offer) => offer,
            Err(e) => {
                messages.push(Message::error(format!("CONNECTION FAILED: {}", reason(&e))));
                return Reply::new(messages);
            }
        };

        self.record(SessionEvent::Detection {
            user_input: text.to_string(),
            detected_state: offer.detected_state.clone(),
            reasoning: offer.reasoning.clone(),
            pathway_count: offer.len(),
        });

        messages.push(
            Message::new(
                MessageKind::State,
                format!("STATE DETECTED: {}", offer.detected_state.to_uppercase()),
            )
            .with_state(offer.detected_state.as_str()),
        );
        if let Some(state) = EnergyState::from_label(&offer.detected_state) {
            messages.push(Message::system(state.description()));
        }
        if let Some(reasoning) = &offer.reasoning {
            messages.push(Message::system(reasoning.as_str()));
        }

        messages.push(Message::system("\nAVAILABLE PATHWAYS:"));
        for (i, option) in offer.pathway_options.iter().enumerate() {
            let mut text = format!(
                "{}. {}\n   {}\n   {}\n   duration: {}",
                i + 1,
                option.target_state.to_uppercase(),
                option.pathway,
                option.physical_effect,
                option.duration
            );
            if let Some(warning) = &option.warning {
                text.push_str(&format!("\n   warning: {}", warning));
            }
            messages.push(Message::new(MessageKind::Pathway, text).with_state(option.target_state.as_str()));
        }
        messages.push(Message::system("\ntype pathway number + optional params:"));
        messages.push(Message::system(
            "examples: \"1\" or \"1, 45 min, 95% new\" or \"2, all new\"",
        ));

        self.offer = Some(offer);
        Reply::new(messages)
    }

    async fn generate(&mut self, line: &str, selection: PathwaySelection) -> Reply {
        let Some(offer) = self.offer.as_ref() else {
            return Reply::new(vec![Message::error("NO ACTIVE PATHWAYS")]);
        };
        let Some(mut request) = GenerationRequest::from_selection(offer, &selection) else {
            return Reply::new(vec![Message::user(line), Message::error("INVALID PATHWAY NUMBER")]);
        };
        request.spotify_user_id = self.user_id.clone();
        request.spotify_access_token = self.access_token.clone();

        let mut messages = vec![Message::user(format!(
            "generating: {} → {}, {} min, {}% discovery",
            request.source_state, request.target_state, request.duration, request.discovery_percentage
        ))];

        match self.backend.generate(&request).await {
            Ok(playlist) => {
                self.record(SessionEvent::Generation {
                    source_state: request.source_state.clone(),
                    target_state: request.target_state.clone(),
                    duration: request.duration,
                    discovery: request.discovery_percentage,
                    playlist_generated: true,
                    playlist_result: playlist.clone(),
                });
                messages.push(Message::system("\nPLAYLIST GENERATED:"));
                messages.push(Message::new(MessageKind::Playlist, playlist));
                self.offer = None;
            }
            Err(e) => {
                messages.push(Message::error(format!("GENERATION FAILED: {}", reason(&e))));
            }
        }
        Reply::new(messages)
    }

    /// Append to the log; a storage failure does not undo the user's action
    fn record(&self, event: SessionEvent) {
        if let Err(e) = self.log.append(event, Utc::now()) {
            warn!(error = %e, "Could not append session event");
        }
    }
}

fn reason(error: &Error) -> String {
    match error {
        Error::Backend(msg) => msg.clone(),
        other => other.to_string(),
    }
}
