//! Client library for the arena: session upkeep against the game server and
//! local mirroring of the action-queue rules.

pub mod combat;
pub mod config;
pub mod error;
pub mod game;
pub mod http;
pub mod matchmaking;
pub mod protocol;
pub mod session;
pub mod ws;
