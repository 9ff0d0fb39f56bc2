//! Turns user intent into outbound protocol messages and keeps the latest
//! authoritative snapshot.
//!
//! The controller never changes chakra, queues or cooldowns itself; it only
//! forwards requests and reflects what the server sends back. The local
//! validator feeds button states, it never drops a request.

use crate::{
    error::{ClientError, QueueRejection},
    game::{
        queue::{self, Affordance},
        snapshot::{GameSnapshot, Outcome},
        types::{ActionQueueEntry, Character, PlayerView, Skill},
    },
    http::ratings::Rating,
    protocol::ClientMsg,
    session::{Navigate, SessionEvent, SessionHandle},
};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("no match in progress")]
    NoMatch,

    #[error("the match is over")]
    GameOver,

    #[error("no character {0} on our team")]
    UnknownCaster(String),

    #[error("character {caster} has no skill {skill_id}")]
    UnknownSkill { caster: String, skill_id: u32 },

    #[error("select a skill before choosing a target")]
    NothingSelected,

    #[error(transparent)]
    Session(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    ActionRejected,
    Matchmaking,
    ServerError,
    Connection,
}

/// A transient, self-expiring message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: Instant,
}

/// Skill picked for a caster, waiting for a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub caster_instance_id: String,
    pub skill: Skill,
}

/// What the post-game screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PostGame {
    pub outcome: Outcome,
    pub final_log: Option<String>,
    pub rating: Option<Rating>,
}

pub struct CombatController {
    session: SessionHandle,
    notice_ttl: Duration,
    player_id: Option<String>,
    snapshot: Option<GameSnapshot>,
    selection: Option<Selection>,
    notice: Option<Notice>,
    status_line: String,
}

impl CombatController {
    pub fn new(session: SessionHandle, notice_ttl: Duration) -> Self {
        CombatController {
            session,
            notice_ttl,
            player_id: None,
            snapshot: None,
            selection: None,
            notice: None,
            status_line: String::new(),
        }
    }

    /// Player id from an earlier `GAME_START`, e.g. after re-entering the
    /// battle view.
    pub fn with_player_id(mut self, player_id: Option<String>) -> Self {
        self.player_id = player_id;
        self
    }

    // ───────────── inbound ─────────────

    /// Folds one session event in; returns where the app should go, if
    /// anywhere.
    pub fn handle_event(&mut self, ev: &SessionEvent) -> Option<Navigate> {
        match ev {
            SessionEvent::GameStarted {
                player_id,
                snapshot,
            } => {
                self.player_id = Some(player_id.clone());
                self.snapshot = None;
                self.apply_snapshot(snapshot.clone());
            }
            SessionEvent::Snapshot(snapshot) | SessionEvent::GameOver(snapshot) => {
                self.apply_snapshot(snapshot.clone());
            }
            SessionEvent::Status { info, message } => {
                self.status_line = match message {
                    Some(m) if info.queue.is_none() && info.wait_secs <= 0.0 => m.clone(),
                    _ => info.status_line(),
                };
            }
            SessionEvent::ActionRejected(reason) => {
                self.selection = None;
                self.set_notice(NoticeKind::ActionRejected, reason.clone());
            }
            SessionEvent::MatchmakingFailed(reason) => {
                self.set_notice(NoticeKind::Matchmaking, reason.clone());
            }
            SessionEvent::ServerError(reason) => {
                self.set_notice(NoticeKind::ServerError, format!("Error: {reason}"));
            }
            SessionEvent::Disconnected(reason) => {
                self.status_line = "Disconnected.".into();
                if let Some(reason) = reason {
                    self.set_notice(NoticeKind::Connection, reason.clone());
                }
            }
            SessionEvent::OpponentLeft => {
                self.snapshot = None;
                self.selection = None;
                self.status_line = "Opponent has disconnected.".into();
            }
            SessionEvent::StateChanged(state) => {
                log::debug!("controller sees session {state}");
            }
            SessionEvent::ConnectFailed(e) => {
                self.status_line = "Disconnected.".into();
                self.set_notice(NoticeKind::Connection, e.to_string());
            }
            SessionEvent::Undelivered(msg) => {
                log::warn!("request not delivered: {msg:?}");
                self.set_notice(
                    NoticeKind::Connection,
                    "Action not sent: not connected to the server.".into(),
                );
            }
            SessionEvent::AuthRequired(_) => {}
        }
        ev.navigation()
    }

    /// Replaces the held snapshot. A new turn number wipes the local
    /// selection and any notice so nothing stale carries over.
    pub fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        let new_turn = self
            .snapshot
            .as_ref()
            .map_or(true, |old| old.turn != snapshot.turn);
        if new_turn {
            log::debug!("turn {} begins", snapshot.turn);
            self.selection = None;
            self.notice = None;
        }
        self.snapshot = Some(snapshot);
    }

    // ───────────── outbound ─────────────

    pub fn select_skill(&mut self, caster_instance_id: &str, skill_id: u32) -> Result<(), ControllerError> {
        let view = self.live_view()?;
        let caster = view
            .character(caster_instance_id)
            .ok_or_else(|| ControllerError::UnknownCaster(caster_instance_id.to_owned()))?;
        let skill = caster
            .skill(skill_id)
            .ok_or_else(|| ControllerError::UnknownSkill {
                caster: caster_instance_id.to_owned(),
                skill_id,
            })?
            .clone();
        self.selection = Some(Selection {
            caster_instance_id: caster_instance_id.to_owned(),
            skill,
        });
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Completes the selection and asks the server to queue it.
    pub fn select_target(&mut self, target_id: &str) -> Result<(), ControllerError> {
        let view = self.live_view()?;
        let Some(selection) = self.selection.as_ref() else {
            return Err(ControllerError::NothingSelected);
        };
        let entry = ActionQueueEntry {
            caster_instance_id: selection.caster_instance_id.clone(),
            skill: selection.skill.clone(),
            target_id: target_id.to_owned(),
        };
        if let Err(reason) = queue::check_queue(&entry, &view.action_queue, view) {
            log::debug!("local check disagrees ({reason}); sending anyway");
        }

        self.session.send(ClientMsg::QueueSkill {
            skill: entry.skill,
            caster_id: entry.caster_instance_id,
            target_id: entry.target_id,
        })?;
        self.selection = None;
        Ok(())
    }

    pub fn remove_queued(&mut self, index: usize) -> Result<(), ControllerError> {
        self.live_view()?;
        self.session.send(ClientMsg::DequeueSkill { queue_index: index })?;
        Ok(())
    }

    pub fn reorder_queued(&mut self, from: usize, to: usize) -> Result<(), ControllerError> {
        self.live_view()?;
        self.session.send(ClientMsg::ReorderQueue {
            old_index: from,
            new_index: to,
        })?;
        Ok(())
    }

    pub fn submit_turn(&mut self) -> Result<(), ControllerError> {
        self.live_view()?;
        self.session.send(ClientMsg::ExecuteTurn {})?;
        Ok(())
    }

    // ───────────── read side ─────────────

    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// The current notice, unless it has expired.
    pub fn notice(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| now < n.expires_at)
    }

    pub fn my_view(&self) -> Option<&PlayerView> {
        let id = self.player_id.as_deref()?;
        self.snapshot.as_ref()?.view(id)
    }

    pub fn opponent_view(&self) -> Option<&PlayerView> {
        let id = self.player_id.as_deref()?;
        self.snapshot.as_ref()?.opponent_of(id).map(|(_, v)| v)
    }

    pub fn is_my_turn(&self) -> bool {
        match (self.snapshot.as_ref(), self.player_id.as_deref()) {
            (Some(s), Some(id)) => s.is_turn_of(id),
            _ => false,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.is_game_over)
    }

    /// Button state for one of our skills; `None` outside a match. Callers
    /// also grey everything out while `!is_my_turn()`.
    pub fn affordance(&self, caster: &Character, skill: &Skill) -> Option<Affordance> {
        let view = self.my_view()?;
        Some(queue::affordance(view, caster, skill))
    }

    /// Whether a concrete action would pass the local check.
    pub fn check(&self, entry: &ActionQueueEntry) -> Result<(), QueueRejection> {
        match self.my_view() {
            Some(view) => queue::check_queue(entry, &view.action_queue, view),
            None => Err(QueueRejection::UnknownCaster(entry.caster_instance_id.clone())),
        }
    }

    /// Summary for the post-game screen; `None` until a match has been seen.
    pub fn post_game(&self, rating: Option<Rating>) -> Option<PostGame> {
        let snapshot = self.snapshot.as_ref()?;
        let id = self.player_id.as_deref()?;
        Some(PostGame {
            outcome: snapshot.outcome_for(id),
            final_log: snapshot.last_log().map(str::to_owned),
            rating,
        })
    }

    fn live_view(&self) -> Result<&PlayerView, ControllerError> {
        let snapshot = self.snapshot.as_ref().ok_or(ControllerError::NoMatch)?;
        if snapshot.is_game_over {
            return Err(ControllerError::GameOver);
        }
        let id = self.player_id.as_deref().ok_or(ControllerError::NoMatch)?;
        snapshot.view(id).ok_or(ControllerError::NoMatch)
    }

    fn set_notice(&mut self, kind: NoticeKind, text: String) {
        self.notice = Some(Notice {
            kind,
            text,
            expires_at: Instant::now() + self.notice_ttl,
        });
    }
}
