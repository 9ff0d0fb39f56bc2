//! Runtime configuration for the arena client.

use crate::session::backoff::ReconnectPolicy;
use once_cell::sync::Lazy;
use std::{env, path::PathBuf, time::Duration};

#[derive(Debug)]
pub struct Settings {
    /// Game server WebSocket endpoint.
    pub ws_url: String,
    /// REST API base, used for the post-game rating.
    pub api_url: String,
    /// Token from the environment; the store is consulted otherwise.
    pub token: Option<String>,
    /// Where persisted local state lives.
    pub store_path: PathBuf,
    pub reconnect_max_attempts: u32,
    pub reconnect_base_ms: u64,
    pub reconnect_cap_ms: u64,
    /// Lifetime of transient notices.
    pub notice_ttl_ms: u64,
    pub channel_capacity: usize,
}

fn var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn default_store_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("arena-client");
    path.push("state.json");
    path
}

impl Settings {
    fn from_env() -> Self {
        let ws_url = env::var("ARENA_WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:8080/ws".into());
        let api_url = env::var("ARENA_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".into());
        let token = env::var("ARENA_TOKEN").ok().filter(|t| !t.is_empty());
        let store_path = env::var("ARENA_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_store_path());

        Settings {
            ws_url,
            api_url,
            token,
            store_path,
            reconnect_max_attempts: var_or("RECONNECT_MAX_ATTEMPTS", 5),
            reconnect_base_ms: var_or("RECONNECT_BASE_MS", 1_000),
            reconnect_cap_ms: var_or("RECONNECT_CAP_MS", 10_000),
            notice_ttl_ms: var_or("NOTICE_TTL_MS", 4_000),
            channel_capacity: var_or("CHANNEL_CAPACITY", 64),
        }
    }

    /// Value-level config handed to the session and controller.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            ws_url: self.ws_url.clone(),
            reconnect: ReconnectPolicy {
                max_attempts: self.reconnect_max_attempts,
                base: Duration::from_millis(self.reconnect_base_ms),
                cap: Duration::from_millis(self.reconnect_cap_ms),
            },
            notice_ttl: Duration::from_millis(self.notice_ttl_ms),
            channel_capacity: self.channel_capacity.max(1),
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}

/// Everything the session driver and controller need, without touching the
/// environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ws_url: String,
    pub reconnect: ReconnectPolicy,
    pub notice_ttl: Duration,
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            ws_url: "ws://127.0.0.1:8080/ws".into(),
            reconnect: ReconnectPolicy::default(),
            notice_ttl: Duration::from_secs(4),
            channel_capacity: 64,
        }
    }
}
