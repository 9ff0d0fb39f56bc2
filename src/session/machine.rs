//! Connection lifecycle as an explicit transition table.
//!
//! ```text
//!   Idle ──► Connecting ──open──► Connected(InQueue) ──GAME_START──► Connected(Paired)
//!    ▲           ▲                        │                                  │
//!    │           │                        └──────────close/error─────────────┤
//!    │           └──backoff── Reconnecting ◄── Closed ◄──────────────────────┘
//!    └─────────── leave / terminal error / ceiling reached ──┘
//! ```
//!
//! The machine performs no I/O. Each input returns a [`Next`] telling the
//! driver what to do with the transport.

use crate::{
    error::ClientError,
    matchmaking::{QueueInfo, StatusUpdate},
    session::{
        backoff::ReconnectPolicy,
        store::{LocalStore, PersistedState},
    },
};
use std::{fmt, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    InQueue,
    Paired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected(Membership),
    Closed,
    /// Waiting out the backoff before attempt `attempt` (1-based).
    Reconnecting { attempt: u32, delay: Duration },
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected(Membership::InQueue) => write!(f, "connected (in queue)"),
            ConnectionState::Connected(Membership::Paired) => write!(f, "connected (paired)"),
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Reconnecting { attempt, delay } => {
                write!(f, "reconnecting (attempt {attempt} in {delay:?})")
            }
        }
    }
}

/// Why the connection went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    /// Drop, unreachable server, socket error.
    Transport,
    /// Missing or refused credentials.
    Auth,
    MatchmakingFailure,
    /// `ERROR` frame from the server.
    ServerError,
    OpponentLeft,
    /// Explicit leave by the user.
    Left,
}

/// Follow-up the driver must perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Connect,
    Wait(Duration),
    Disconnect,
    Nothing,
}

pub struct SessionMachine {
    state: ConnectionState,
    /// Membership at the last moment we were connected.
    membership: Option<Membership>,
    attempts: u32,
    queue_info: QueueInfo,
    policy: ReconnectPolicy,
    store: Box<dyn LocalStore>,
    persisted: PersistedState,
}

impl fmt::Debug for SessionMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionMachine")
            .field("state", &self.state)
            .field("membership", &self.membership)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl SessionMachine {
    pub fn new(policy: ReconnectPolicy, store: Box<dyn LocalStore>) -> Self {
        let persisted = store.load();
        SessionMachine {
            state: ConnectionState::Idle,
            membership: None,
            attempts: 0,
            queue_info: QueueInfo::default(),
            policy,
            store,
            persisted,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn membership(&self) -> Option<Membership> {
        self.membership
    }

    /// Reconnect attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn queue_info(&self) -> &QueueInfo {
        &self.queue_info
    }

    pub fn token(&self) -> Option<&str> {
        self.persisted.token.as_deref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.persisted.player_id.as_deref()
    }

    /// A queue-membership flag survived from an earlier view or run.
    pub fn has_persisted_membership(&self) -> bool {
        self.persisted.in_queue
    }

    pub fn is_queueing(&self) -> bool {
        match self.state {
            ConnectionState::Connecting => self.membership != Some(Membership::Paired),
            ConnectionState::Connected(m) => m == Membership::InQueue,
            ConnectionState::Reconnecting { .. } => self.membership == Some(Membership::InQueue),
            ConnectionState::Idle | ConnectionState::Closed => false,
        }
    }

    pub fn set_token(&mut self, token: &str) {
        self.persisted.token = Some(token.to_owned());
        self.persist();
    }

    /// Idle → Connecting on user intent.
    pub fn request_match(&mut self) -> Result<Next, ClientError> {
        if self.state != ConnectionState::Idle {
            log::debug!("find-match ignored, session is {}", self.state);
            return Ok(Next::Nothing);
        }
        self.require_token()?;
        self.transition(ConnectionState::Connecting);
        Ok(Next::Connect)
    }

    /// Idle → Connecting at startup when a membership flag was persisted.
    pub fn resume(&mut self) -> Result<Next, ClientError> {
        if self.state != ConnectionState::Idle || !self.persisted.in_queue {
            return Ok(Next::Nothing);
        }
        if let Err(e) = self.require_token() {
            self.go_idle();
            return Err(e);
        }
        self.membership = Some(Membership::InQueue);
        self.transition(ConnectionState::Connecting);
        Ok(Next::Connect)
    }

    /// Transport is open.
    pub fn on_open(&mut self) -> Next {
        if self.state != ConnectionState::Connecting {
            log::warn!("transport opened while {}; dropping it", self.state);
            return Next::Disconnect;
        }
        let membership = self.membership.unwrap_or(Membership::InQueue);
        self.membership = Some(membership);
        self.attempts = 0;
        self.persisted.in_queue = true;
        self.persist();
        self.transition(ConnectionState::Connected(membership));
        Next::Nothing
    }

    /// `GAME_START`: queueing ends, we are paired.
    pub fn on_match_found(&mut self, player_id: &str) -> bool {
        match self.state {
            ConnectionState::Connected(_) => {
                self.membership = Some(Membership::Paired);
                self.persisted.player_id = Some(player_id.to_owned());
                self.persisted.in_queue = true;
                self.persist();
                self.queue_info = QueueInfo::default();
                self.transition(ConnectionState::Connected(Membership::Paired));
                true
            }
            other => {
                log::warn!("match found while {other}; ignored");
                false
            }
        }
    }

    pub fn on_status(&mut self, status: &StatusUpdate) {
        self.queue_info.update(status);
    }

    /// The connection is gone (or must go) for `cause`.
    pub fn on_closed(&mut self, cause: CloseCause) -> Next {
        if self.state == ConnectionState::Idle {
            return Next::Nothing;
        }
        if let ConnectionState::Connected(m) = self.state {
            self.membership = Some(m);
        }
        self.transition(ConnectionState::Closed);

        if cause != CloseCause::Transport || self.membership.is_none() {
            self.go_idle();
            return Next::Disconnect;
        }

        match self.policy.delay(self.attempts) {
            Some(delay) => {
                self.attempts += 1;
                log::warn!(
                    "connection lost, retry {}/{} in {delay:?}",
                    self.attempts,
                    self.policy.max_attempts
                );
                self.transition(ConnectionState::Reconnecting {
                    attempt: self.attempts,
                    delay,
                });
                Next::Wait(delay)
            }
            None => {
                log::warn!("giving up after {} reconnect attempts", self.attempts);
                self.go_idle();
                Next::Disconnect
            }
        }
    }

    /// Reconnecting → Connecting once the backoff has elapsed.
    pub fn on_backoff_elapsed(&mut self) -> Next {
        match self.state {
            ConnectionState::Reconnecting { .. } => {
                self.transition(ConnectionState::Connecting);
                Next::Connect
            }
            _ => Next::Nothing,
        }
    }

    /// Explicit leave.
    pub fn leave(&mut self) -> Next {
        if self.state == ConnectionState::Idle {
            self.clear_membership();
            return Next::Nothing;
        }
        self.on_closed(CloseCause::Left)
    }

    fn require_token(&self) -> Result<(), ClientError> {
        match self.persisted.token.as_deref() {
            Some(t) if !t.is_empty() => Ok(()),
            _ => Err(ClientError::Auth {
                reason: "no authentication token; please log in again".into(),
            }),
        }
    }

    fn go_idle(&mut self) {
        self.membership = None;
        self.attempts = 0;
        self.queue_info = QueueInfo::default();
        self.clear_membership();
        self.transition(ConnectionState::Idle);
    }

    fn clear_membership(&mut self) {
        if self.persisted.in_queue {
            self.persisted.in_queue = false;
            self.persist();
        }
    }

    fn transition(&mut self, to: ConnectionState) {
        if self.state != to {
            log::info!("session {} → {}", self.state, to);
            self.state = to;
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.persisted) {
            log::warn!("could not persist session state: {e}");
        }
    }
}
