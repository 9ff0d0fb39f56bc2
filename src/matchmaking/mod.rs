//! Queue metadata pushed by the server while we wait for an opponent.
//
//  None of this gates a session transition; it only feeds the status line.

use serde::{Deserialize, Serialize};

/// Body of a `STATUS` frame.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Name of the queue we are in (e.g. "ranked").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    /// Seconds spent waiting so far.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_queue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_in_queue: Option<u32>,
    #[serde(default)]
    pub priority: bool,
}

/// Last known queue metadata kept by the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueInfo {
    pub queue: Option<String>,
    pub position: Option<u32>,
    pub total: Option<u32>,
    pub wait_secs: f64,
    pub priority: bool,
}

impl QueueInfo {
    /// Folds a status frame in; fields the frame omits keep their value.
    pub fn update(&mut self, status: &StatusUpdate) {
        if status.queue.is_some() {
            self.queue = status.queue.clone();
        }
        if status.queue_position.is_some() {
            self.position = status.queue_position;
        }
        if status.total_in_queue.is_some() {
            self.total = status.total_in_queue;
        }
        if let Some(secs) = status.time_in_queue {
            self.wait_secs = secs;
        }
        self.priority = status.priority;
    }

    /// One-line status, e.g. `In ranked queue... Time in queue: 1:05 (3/12)`.
    pub fn status_line(&self) -> String {
        let queue = self.queue.as_deref().unwrap_or("matchmaking");
        let mut line = format!(
            "In {queue} queue... Time in queue: {}",
            format_wait(self.wait_secs)
        );
        if let (Some(pos), Some(total)) = (self.position, self.total) {
            line.push_str(&format!(" ({pos}/{total})"));
        }
        if self.priority {
            line.push_str(" [priority]");
        }
        line
    }
}

/// `m:ss`; anything non-finite or negative shows as `0:00`.
pub fn format_wait(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        0.0
    };
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{mins}:{secs:02}")
}
