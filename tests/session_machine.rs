//! Connection state machine: transitions, reconnect ceiling and the
//! persisted membership flag.

use arena_client::{
    error::ClientError,
    matchmaking::StatusUpdate,
    session::{
        backoff::ReconnectPolicy,
        store::{LocalStore, MemoryStore, PersistedState},
        CloseCause, ConnectionState, Membership, Next, SessionMachine,
    },
};
use std::time::Duration;

fn machine(store: &MemoryStore) -> SessionMachine {
    SessionMachine::new(ReconnectPolicy::default(), Box::new(store.clone()))
}

/// Idle → Connecting → Connected(InQueue).
fn queued(store: &MemoryStore) -> SessionMachine {
    let mut m = machine(store);
    assert_eq!(m.request_match().unwrap(), Next::Connect);
    assert_eq!(m.on_open(), Next::Nothing);
    m
}

#[test]
fn backoff_doubles_and_caps() {
    let policy = ReconnectPolicy::default();
    let delays: Vec<_> = policy.schedule().map(|d| d.as_secs()).collect();
    assert_eq!(delays, vec![1, 2, 4, 8, 10]);
    assert_eq!(policy.delay(5), None);
    assert!(policy.schedule().all(|d| d <= policy.cap));
}

#[test]
fn backoff_survives_huge_attempt_numbers() {
    let policy = ReconnectPolicy {
        max_attempts: u32::MAX,
        base: Duration::from_secs(1),
        cap: Duration::from_secs(10),
    };
    assert_eq!(policy.delay(40), Some(Duration::from_secs(10)));
    assert_eq!(policy.delay(1_000), Some(Duration::from_secs(10)));
}

#[test]
fn find_match_without_token_is_an_auth_error() {
    let store = MemoryStore::default();
    let mut m = machine(&store);
    let err = m.request_match().unwrap_err();
    assert!(matches!(err, ClientError::Auth { .. }));
    assert!(err.is_fatal());
    assert_eq!(m.state(), ConnectionState::Idle);
}

#[test]
fn open_enters_queue_and_persists_flag() {
    let store = MemoryStore::with_token("t0k");
    let m = queued(&store);
    assert_eq!(m.state(), ConnectionState::Connected(Membership::InQueue));
    assert!(m.is_queueing());
    assert!(store.load().in_queue);
}

#[test]
fn find_match_while_busy_is_ignored() {
    let store = MemoryStore::with_token("t0k");
    let mut m = queued(&store);
    assert_eq!(m.request_match().unwrap(), Next::Nothing);
    assert_eq!(m.state(), ConnectionState::Connected(Membership::InQueue));
}

#[test]
fn game_start_pairs_and_remembers_player() {
    let store = MemoryStore::with_token("t0k");
    let mut m = queued(&store);
    m.on_status(&StatusUpdate {
        queue: Some("ranked".into()),
        time_in_queue: Some(12.0),
        ..StatusUpdate::default()
    });
    assert_eq!(m.queue_info().queue.as_deref(), Some("ranked"));

    assert!(m.on_match_found("p1"));
    assert_eq!(m.state(), ConnectionState::Connected(Membership::Paired));
    assert!(!m.is_queueing());
    assert_eq!(m.queue_info().queue, None);
    assert_eq!(store.load().player_id.as_deref(), Some("p1"));
}

#[test]
fn match_found_outside_connection_is_ignored() {
    let store = MemoryStore::with_token("t0k");
    let mut m = machine(&store);
    assert!(!m.on_match_found("p1"));
    assert_eq!(m.state(), ConnectionState::Idle);
}

#[test]
fn drop_reconnects_with_growing_delays_then_gives_up() {
    let store = MemoryStore::with_token("t0k");
    let mut m = queued(&store);

    let mut delays = Vec::new();
    // the first close comes from the open socket, the rest from failed connects
    loop {
        match m.on_closed(CloseCause::Transport) {
            Next::Wait(d) => {
                delays.push(d.as_secs());
                assert!(matches!(m.state(), ConnectionState::Reconnecting { .. }));
                assert!(m.has_persisted_membership());
                assert_eq!(m.on_backoff_elapsed(), Next::Connect);
                assert_eq!(m.state(), ConnectionState::Connecting);
            }
            Next::Disconnect => break,
            other => panic!("unexpected {other:?}"),
        }
    }

    assert_eq!(delays, vec![1, 2, 4, 8, 10]);
    assert_eq!(m.state(), ConnectionState::Idle);
    assert_eq!(m.attempts(), 0);
    assert!(!store.load().in_queue);
}

#[test]
fn successful_reconnect_resets_attempts_and_keeps_pairing() {
    let store = MemoryStore::with_token("t0k");
    let mut m = queued(&store);
    m.on_match_found("p1");

    assert!(matches!(m.on_closed(CloseCause::Transport), Next::Wait(_)));
    assert!(matches!(
        m.state(),
        ConnectionState::Reconnecting { attempt: 1, .. }
    ));
    m.on_backoff_elapsed();
    m.on_open();

    assert_eq!(m.attempts(), 0);
    assert_eq!(m.state(), ConnectionState::Connected(Membership::Paired));
}

#[test]
fn first_connect_failure_without_membership_goes_idle() {
    let store = MemoryStore::with_token("t0k");
    let mut m = machine(&store);
    m.request_match().unwrap();
    assert_eq!(m.on_closed(CloseCause::Transport), Next::Disconnect);
    assert_eq!(m.state(), ConnectionState::Idle);
}

#[test]
fn terminal_causes_never_retry() {
    for cause in [
        CloseCause::Auth,
        CloseCause::MatchmakingFailure,
        CloseCause::ServerError,
        CloseCause::OpponentLeft,
        CloseCause::Left,
    ] {
        let store = MemoryStore::with_token("t0k");
        let mut m = queued(&store);
        m.on_match_found("p1");
        assert_eq!(m.on_closed(cause), Next::Disconnect, "{cause:?}");
        assert_eq!(m.state(), ConnectionState::Idle, "{cause:?}");
        assert!(!store.load().in_queue, "{cause:?}");
    }
}

#[test]
fn leave_clears_persisted_flag_and_keeps_token() {
    let store = MemoryStore::with_token("t0k");
    let mut m = queued(&store);
    assert_eq!(m.leave(), Next::Disconnect);
    assert_eq!(m.state(), ConnectionState::Idle);

    let persisted = store.load();
    assert!(!persisted.in_queue);
    assert_eq!(persisted.token.as_deref(), Some("t0k"));
}

#[test]
fn leave_while_idle_still_clears_stale_flag() {
    let store = MemoryStore::new(PersistedState {
        token: None,
        player_id: None,
        in_queue: true,
    });
    let mut m = machine(&store);
    assert_eq!(m.leave(), Next::Nothing);
    assert!(!store.load().in_queue);
}

#[test]
fn persisted_flag_resumes_the_session() {
    let store = MemoryStore::new(PersistedState {
        token: Some("t0k".into()),
        player_id: Some("p1".into()),
        in_queue: true,
    });
    let mut m = machine(&store);
    assert!(m.has_persisted_membership());
    assert_eq!(m.resume().unwrap(), Next::Connect);
    assert_eq!(m.state(), ConnectionState::Connecting);
    assert_eq!(m.membership(), Some(Membership::InQueue));
    assert_eq!(m.player_id(), Some("p1"));
}

#[test]
fn resume_without_token_clears_the_flag() {
    let store = MemoryStore::new(PersistedState {
        in_queue: true,
        ..PersistedState::default()
    });
    let mut m = machine(&store);
    assert!(m.resume().is_err());
    assert_eq!(m.state(), ConnectionState::Idle);
    assert!(!store.load().in_queue);
}

#[test]
fn nothing_persisted_means_nothing_to_resume() {
    let store = MemoryStore::with_token("t0k");
    let mut m = machine(&store);
    assert_eq!(m.resume().unwrap(), Next::Nothing);
    assert_eq!(m.state(), ConnectionState::Idle);
}

#[test]
fn late_open_is_refused() {
    let store = MemoryStore::with_token("t0k");
    let mut m = machine(&store);
    assert_eq!(m.on_open(), Next::Disconnect);
    assert_eq!(m.state(), ConnectionState::Idle);
}

#[test]
fn login_stores_token() {
    let store = MemoryStore::default();
    let mut m = machine(&store);
    m.set_token("fresh");
    assert_eq!(m.token(), Some("fresh"));
    assert_eq!(store.load().token.as_deref(), Some("fresh"));
    assert_eq!(m.request_match().unwrap(), Next::Connect);
}
