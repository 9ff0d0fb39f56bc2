//! Authoritative match state as delivered by the server.
//!
//! The client holds at most one snapshot and replaces it wholesale on every
//! update; nothing here mutates a snapshot in place.

use crate::game::types::PlayerView;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(default)]
    pub turn: u32,
    #[serde(default)]
    pub active_player_id: String,
    /// player id → that player's side of the board
    #[serde(default)]
    pub players: BTreeMap<String, PlayerView>,
    #[serde(default)]
    pub is_game_over: bool,
    /// Append-only, human readable.
    #[serde(default)]
    pub log: Vec<String>,
}

/// Final result from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Victory,
    Defeat,
    Draw,
}

impl GameSnapshot {
    pub fn view(&self, player_id: &str) -> Option<&PlayerView> {
        self.players.get(player_id)
    }

    /// The other side of a two-player match.
    pub fn opponent_of(&self, player_id: &str) -> Option<(&str, &PlayerView)> {
        self.players
            .iter()
            .find(|(id, _)| id.as_str() != player_id)
            .map(|(id, view)| (id.as_str(), view))
    }

    pub fn is_turn_of(&self, player_id: &str) -> bool {
        !player_id.is_empty() && self.active_player_id == player_id
    }

    pub fn last_log(&self) -> Option<&str> {
        self.log.last().map(String::as_str)
    }

    /// Victory when some of our characters stand and none of theirs do.
    pub fn outcome_for(&self, player_id: &str) -> Outcome {
        let mine = self.view(player_id).is_some_and(PlayerView::any_alive);
        let theirs = self
            .opponent_of(player_id)
            .is_some_and(|(_, view)| view.any_alive());
        match (mine, theirs) {
            (true, false) => Outcome::Victory,
            (false, true) => Outcome::Defeat,
            _ => Outcome::Draw,
        }
    }
}
