//! Integration tests for the terminal session controller
//!
//! Tests the full path: input line -> parser -> backend -> session log -> reply

mod common;

use pretty_assertions::assert_eq;
use std::sync::Arc;

use common::MockBackend;
use museshift::core::{KvStore, MemoryStore, SessionLog, Terminal, TOKEN_KEY};
use museshift::types::{MessageKind, Reply, ReplyAction, SessionEvent};

fn setup(backend: MockBackend) -> (Terminal, Arc<MockBackend>, Arc<MemoryStore>) {
    let backend = Arc::new(backend);
    let store = Arc::new(MemoryStore::new());
    let terminal = Terminal::new(
        backend.clone(),
        store.clone(),
        Some("listener42".into()),
        Some("token-abc".into()),
    )
    .unwrap();
    (terminal, backend, store)
}

fn texts(reply: &Reply) -> Vec<&str> {
    reply.messages.iter().map(|m| m.text.as_str()).collect()
}

fn contains(reply: &Reply, needle: &str) -> bool {
    reply.messages.iter().any(|m| m.text.contains(needle))
}

#[tokio::test]
async fn test_describe_then_select() {
    let (mut terminal, backend, store) = setup(MockBackend::new("fraymark"));

    let reply = terminal.handle_line("scattered and tight").await;
    assert!(!reply.has_error());
    assert!(contains(&reply, "STATE DETECTED: FRAYMARK"));
    assert_eq!(
        reply.messages.iter().filter(|m| m.kind == MessageKind::Pathway).count(),
        3
    );
    assert_eq!(terminal.offer().map(|o| o.len()), Some(3));

    let reply = terminal.handle_line("2, 45 min, 95% new").await;
    assert!(!reply.has_error(), "{:?}", texts(&reply));
    assert!(contains(&reply, "generating: fraymark → lowline, 45 min, 95% discovery"));
    assert!(reply.messages.iter().any(|m| m.kind == MessageKind::Playlist));
    assert!(terminal.offer().is_none());

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target_state, "lowline");
    assert_eq!(requests[0].duration, 45);
    assert_eq!(requests[0].discovery_percentage, 95);
    assert_eq!(requests[0].spotify_user_id.as_deref(), Some("listener42"));
    assert_eq!(requests[0].spotify_access_token.as_deref(), Some("token-abc"));

    let sessions = SessionLog::new(store).load().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(matches!(sessions[0].event, SessionEvent::Detection { pathway_count: 3, .. }));
    assert!(sessions[1].is_playlist());
    assert!(sessions[1].id > sessions[0].id);
}

#[tokio::test]
async fn test_out_of_range_keeps_offer() {
    let (mut terminal, backend, _store) = setup(MockBackend::new("voltage"));
    terminal.handle_line("buzzing").await;

    let reply = terminal.handle_line("5").await;
    assert!(reply.has_error());
    assert!(contains(&reply, "INVALID PATHWAY NUMBER"));
    assert!(terminal.offer().is_some());
    assert!(backend.requests.lock().unwrap().is_empty());

    // Retry against the same offer
    let reply = terminal.handle_line("1, all new").await;
    assert!(!reply.has_error());
    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].duration, 40);
    assert_eq!(requests[0].discovery_percentage, 100);
}

#[tokio::test]
async fn test_digits_without_offer_are_a_description() {
    let (mut terminal, backend, _store) = setup(MockBackend::new("lowline"));
    terminal.handle_line("3 hours of sleep").await;
    assert_eq!(*backend.detections.lock().unwrap(), vec!["3 hours of sleep".to_string()]);
    assert!(backend.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_detection_failure() {
    let mut backend = MockBackend::new("voltage");
    backend.fail_detect = true;
    let (mut terminal, _backend, store) = setup(backend);

    let reply = terminal.handle_line("wired").await;
    assert!(contains(&reply, "CONNECTION FAILED: HTTP 502: Bad Gateway"));
    assert!(terminal.offer().is_none());
    assert!(SessionLog::new(store).load().unwrap().is_empty());
}

#[tokio::test]
async fn test_generation_failure_keeps_offer() {
    let mut backend = MockBackend::new("voltage");
    backend.fail_generate = true;
    let (mut terminal, _backend, store) = setup(backend);

    terminal.handle_line("wired").await;
    let reply = terminal.handle_line("1").await;
    assert!(contains(&reply, "GENERATION FAILED: HTTP 500"));
    assert!(terminal.offer().is_some());
    assert_eq!(SessionLog::new(store).load().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stats_and_clear() {
    let (mut terminal, _backend, store) = setup(MockBackend::new("Clearmark"));
    terminal.handle_line("steady").await;
    terminal.handle_line("1").await;

    let reply = terminal.handle_line("stats").await;
    assert!(contains(&reply, "State checks: 1"));
    assert!(contains(&reply, "Playlists generated: 1"));
    assert!(contains(&reply, "clearmark: 1x"));

    terminal.handle_line("steady again").await;
    let reply = terminal.handle_line("CLEAR").await;
    assert_eq!(reply.action, ReplyAction::ResetScreen);
    assert!(contains(&reply, "today: 0 state checks | 0 playlists"));
    assert!(terminal.offer().is_none());
    assert!(SessionLog::new(store).load().unwrap().is_empty());
}

#[tokio::test]
async fn test_help_lists_commands() {
    let (mut terminal, _backend, _store) = setup(MockBackend::new("voltage"));
    let reply = terminal.handle_line("help").await;
    assert_eq!(reply.action, ReplyAction::None);
    for keyword in ["stats", "clear", "logout"] {
        assert!(contains(&reply, keyword), "missing {}", keyword);
    }
}

#[tokio::test]
async fn test_logout_removes_token() {
    let (mut terminal, _backend, store) = setup(MockBackend::new("voltage"));
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("token-abc"));

    let reply = terminal.handle_line("logout").await;
    assert_eq!(reply.action, ReplyAction::Logout);
    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_stored_token_is_reused() {
    let store = Arc::new(MemoryStore::new());
    store.set(TOKEN_KEY, "remembered").unwrap();
    let backend = Arc::new(MockBackend::new("voltage"));
    let mut terminal = Terminal::new(backend.clone(), store, None, None).unwrap();

    terminal.handle_line("wired").await;
    terminal.handle_line("1").await;
    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests[0].spotify_access_token.as_deref(), Some("remembered"));
}

#[tokio::test]
async fn test_blank_line_is_ignored() {
    let (mut terminal, backend, _store) = setup(MockBackend::new("voltage"));
    let reply = terminal.handle_line("   ").await;
    assert!(reply.messages.is_empty());
    assert!(backend.detections.lock().unwrap().is_empty());
}
