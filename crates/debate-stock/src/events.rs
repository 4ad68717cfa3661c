//! Progress events streamed to the caller
//!
//! A run emits any number of `status` events, one `agent_done` per analyst,
//! then exactly one terminal `complete` or `error`.

use crate::debate::AgentRole;
use crate::result::AnalysisResult;
use serde::{Deserialize, Serialize};

/// One event of an analysis stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    /// Human-readable progress note
    Status { message: String },
    /// An analyst finished
    AgentDone { agent: AgentRole, text: String },
    /// Terminal success
    Complete { data: Box<AnalysisResult> },
    /// Terminal failure
    Error { message: String },
}

impl AnalysisEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True for `complete` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// JSON form of the event
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Server-sent-events frame: `data: <json>\n\n`
    pub fn to_sse(&self) -> serde_json::Result<String> {
        Ok(format!("data: {}\n\n", self.to_json()?))
    }
}
