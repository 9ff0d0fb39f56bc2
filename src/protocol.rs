//! Wire-protocol spoken with the game server: JSON records discriminated by
//! a `type` field.

use crate::{
    game::{snapshot::GameSnapshot, types::Skill},
    matchmaking::StatusUpdate,
};
use serde::{Deserialize, Serialize};

// ---------- server → client ----------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMsg {
    /// Queue/connection progress; informational only.
    Status(StatusUpdate),
    /// Match found.
    GameStart {
        #[serde(rename = "yourId")]
        your_id: String,
        state: GameSnapshot,
    },
    GameUpdate {
        state: GameSnapshot,
    },
    ActionError {
        #[serde(default)]
        message: String,
    },
    MatchmakingError {
        #[serde(default)]
        message: String,
    },
    OpponentDisconnected,
    /// Terminal; the server closes the socket after it.
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ServerMsg {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------- client → server ----------
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMsg {
    QueueSkill {
        skill: Skill,
        #[serde(rename = "casterId")]
        caster_id: String,
        #[serde(rename = "targetId")]
        target_id: String,
    },
    DequeueSkill {
        #[serde(rename = "queueIndex")]
        queue_index: usize,
    },
    ReorderQueue {
        #[serde(rename = "oldIndex")]
        old_index: usize,
        #[serde(rename = "newIndex")]
        new_index: usize,
    },
    ExecuteTurn {},
}

impl ClientMsg {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
