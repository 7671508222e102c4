// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// The seven release-note categories. Every classification path ends in one
/// of these; anything else a backend says is mapped back onto them locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Feat,
    Fix,
    Refactor,
    Docs,
    Style,
    Test,
    Chore,
}

impl ChangeType {
    /// All types in rendering order.
    pub const ALL: &[&str] = &["feat", "fix", "refactor", "docs", "style", "test", "chore"];

    pub const VARIANTS: [ChangeType; 7] = [
        Self::Feat,
        Self::Fix,
        Self::Refactor,
        Self::Docs,
        Self::Style,
        Self::Test,
        Self::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Refactor => "refactor",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Test => "test",
            Self::Chore => "chore",
        }
    }

    /// Exact, lowercase match only. Use `heuristic::normalize_type` for the
    /// forgiving variant that accepts aliases like `feature` or `perf`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "feat" => Some(Self::Feat),
            "fix" => Some(Self::Fix),
            "refactor" => Some(Self::Refactor),
            "docs" => Some(Self::Docs),
            "style" => Some(Self::Style),
            "test" => Some(Self::Test),
            "chore" => Some(Self::Chore),
            _ => None,
        }
    }

    /// Section heading used by the changelog renderer.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Feat => "Features",
            Self::Fix => "Bug Fixes",
            Self::Refactor => "Refactoring",
            Self::Docs => "Documentation",
            Self::Style => "Styling",
            Self::Test => "Tests",
            Self::Chore => "Chores",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&s.trim().to_lowercase()).ok_or_else(|| {
            format!(
                "unknown change type '{s}', expected one of: {}",
                Self::ALL.join(", ")
            )
        })
    }
}

/// One resolved commit. Identity is the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub message: String,
    pub author: String,
    /// Author date, strict ISO 8601 as printed by `git log --format=%aI`.
    pub timestamp: String,
    /// Unified diff, capped at `max_diff_lines` by the resolver.
    pub diff: String,
    pub parents: Vec<String>,
}

impl PartialEq for CommitRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CommitRecord {}

impl CommitRecord {
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }

    /// A merge by topology or by the conventional `Merge ...` message.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1 || self.message.trim_start().starts_with("Merge")
    }
}
