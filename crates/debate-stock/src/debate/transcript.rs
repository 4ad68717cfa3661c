//! Analyst roles and the transcript they fill in

use crate::error::{DebateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the three debating analysts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Bull,
    Bear,
    Quant,
}

impl AgentRole {
    /// Every role, in a fixed order
    pub const ALL: [Self; 3] = [Self::Bull, Self::Bear, Self::Quant];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Bear => "bear",
            Self::Quant => "quant",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analyst outputs keyed by role, filled in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebateTranscript {
    entries: BTreeMap<AgentRole, String>,
}

impl DebateTranscript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` for `role`; returns the previous text if the role was already present
    pub fn record(&mut self, role: AgentRole, text: impl Into<String>) -> Option<String> {
        self.entries.insert(role, text.into())
    }

    /// Text for `role`, if it has arrived
    pub fn get(&self, role: AgentRole) -> Option<&str> {
        self.entries.get(&role).map(String::as_str)
    }

    /// Number of roles recorded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once every role has reported
    pub fn is_complete(&self) -> bool {
        AgentRole::ALL.iter().all(|r| self.entries.contains_key(r))
    }

    /// Freeze into a [`DebateRecord`]; fails if any role is missing
    pub fn into_record(mut self) -> Result<DebateRecord> {
        let mut take = |role: AgentRole| {
            self.entries
                .remove(&role)
                .ok_or_else(|| DebateError::IncompleteDebate(role.to_string()))
        };
        Ok(DebateRecord {
            bull: take(AgentRole::Bull)?,
            bear: take(AgentRole::Bear)?,
            quant: take(AgentRole::Quant)?,
        })
    }
}

/// Completed debate, as stored in the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateRecord {
    pub bull: String,
    pub bear: String,
    pub quant: String,
}
