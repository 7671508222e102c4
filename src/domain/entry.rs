// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

use super::{ChangeType, CommitRecord};

/// A classified commit, ready for rendering. Entries are never edited in
/// place; reclassification produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub description: String,
    pub commit: CommitRecord,
}

impl ChangelogEntry {
    pub fn new(change_type: ChangeType, description: impl Into<String>, commit: CommitRecord) -> Self {
        Self {
            change_type,
            description: description.into(),
            commit,
        }
    }
}

/// Writing register requested from hosted backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritingStyle {
    #[default]
    #[serde(rename = "formal")]
    Formal,
    #[serde(rename = "dev-friendly")]
    DevFriendly,
    #[serde(rename = "pm-style")]
    PmStyle,
}

impl WritingStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::DevFriendly => "dev-friendly",
            Self::PmStyle => "pm-style",
        }
    }
}

impl std::fmt::Display for WritingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WritingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(Self::Formal),
            "dev-friendly" | "dev" => Ok(Self::DevFriendly),
            "pm-style" | "pm" => Ok(Self::PmStyle),
            other => Err(format!(
                "unknown style '{other}', expected formal, dev-friendly or pm-style"
            )),
        }
    }
}
