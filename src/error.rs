use thiserror::Error;

/// Top-level client error.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport failure")]
    Transport(#[from] TransportError),

    #[error("authentication required: {reason}")]
    Auth { reason: String },

    #[error("action rejected: {reason}")]
    ActionRejected { reason: String },

    #[error("matchmaking failed: {reason}")]
    Matchmaking { reason: String },

    #[error("opponent left the match")]
    OpponentLeft,

    /// `ERROR` frame; the server closes the connection after it.
    #[error("server error: {reason}")]
    Server { reason: String },

    #[error("malformed message")]
    Protocol(#[from] serde_json::Error),

    #[error("local state store failed")]
    Store(#[source] std::io::Error),

    #[error("rating lookup failed")]
    Http(#[from] reqwest::Error),

    #[error("session is no longer running")]
    SessionClosed,
}

impl ClientError {
    /// Fatal errors force navigation instead of a transient notice.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClientError::Auth { .. } | ClientError::OpponentLeft)
    }
}

/// Connection level failures. Recovered through the reconnect policy,
/// except `Unauthorized`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("server refused the credentials (status {status})")]
    Unauthorized { status: u16 },

    #[error("invalid server address: {0}")]
    InvalidUrl(String),

    #[error("connection closed")]
    Closed,
}

/// Cost vectors with negative components are invalid input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("negative amount {amount} for chakra type {kind}")]
    NegativeAmount { kind: String, amount: i32 },
}

/// Why a proposed action cannot be queued locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueRejection {
    #[error("no character {0} on this team")]
    UnknownCaster(String),

    #[error("character {0} is defeated")]
    CasterDefeated(String),

    #[error("caster is stunned for this skill class")]
    Stunned,

    #[error("skill {0} is locked")]
    Locked(u32),

    #[error("skill is on cooldown for {remaining} more turn(s)")]
    OnCooldown { remaining: u32 },

    #[error("character {0} already has a queued action")]
    CasterAlreadyQueued(String),

    #[error("invalid cost")]
    InvalidCost(#[from] LedgerError),

    #[error("not enough chakra")]
    Unaffordable,
}
