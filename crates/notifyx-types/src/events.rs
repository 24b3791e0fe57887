use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-recipient state of an in-flight send, for live progress rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Pending,
    Sending,
    Success,
    Error,
}

impl SendStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SendStatus::Success | SendStatus::Error)
    }
}

/// One progress record emitted through the caller-supplied sink during a
/// sequence or bulk send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendProgress {
    pub id: String,
    pub recipient: String,
    pub status: SendStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}
