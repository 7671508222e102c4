// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How two branches are compared. Only decides which commits are in range;
/// merge filtering happens afterwards regardless of the strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonStrategy {
    /// Reachable from `to` but not from `from`.
    #[default]
    OneWay,
    /// Reachable from either side but not both.
    Symmetric,
    /// Reachable from `to` but not from the merge base of both.
    MergeBase,
}

impl ComparisonStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneWay => "one-way",
            Self::Symmetric => "symmetric",
            Self::MergeBase => "merge-base",
        }
    }
}

impl std::fmt::Display for ComparisonStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComparisonStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one-way" | "oneway" => Ok(Self::OneWay),
            "symmetric" => Ok(Self::Symmetric),
            "merge-base" | "mergebase" => Ok(Self::MergeBase),
            other => Err(format!(
                "unknown strategy '{other}', expected one-way, symmetric or merge-base"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchComparison {
    pub from: String,
    pub to: String,
    pub strategy: ComparisonStrategy,
    pub include_merge_commits: bool,
    /// With `Symmetric`, keep the commits that exist only on `from` (they are
    /// not merged into `to`). The other strategies never select that side.
    pub include_unmerged: bool,
}

/// Exactly one way of selecting commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    Count(usize),
    Dates { from: String, to: Option<String> },
    Tags { from: String, to: Option<String> },
    Shas { from: String, to: Option<String> },
    Branches(BranchComparison),
}

impl std::fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Count(n) => write!(f, "last {n} commits"),
            Self::Dates { from, to } => {
                write!(f, "{from} to {}", to.as_deref().unwrap_or("now"))
            }
            Self::Tags { from, to } | Self::Shas { from, to } => {
                write!(f, "{from}..{}", to.as_deref().unwrap_or("HEAD"))
            }
            Self::Branches(b) => write!(f, "{}..{} ({})", b.from, b.to, b.strategy),
        }
    }
}

/// Fallbacks taken from configuration when the caller leaves fields out.
#[derive(Debug, Clone)]
pub struct RangeDefaults {
    pub count: usize,
    pub strategy: ComparisonStrategy,
    pub base_branch: String,
    pub include_merge_commits: bool,
    pub include_unmerged: bool,
}

/// Loose, caller-supplied range fields (one per CLI flag). Turned into a
/// `RangeSpec` only if exactly one selection mode is populated.
#[derive(Debug, Clone, Default)]
pub struct RangeParts {
    pub count: Option<usize>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub from_tag: Option<String>,
    pub to_tag: Option<String>,
    pub from_sha: Option<String>,
    pub to_sha: Option<String>,
    pub from_branch: Option<String>,
    pub to_branch: Option<String>,
    pub strategy: Option<ComparisonStrategy>,
    pub include_merge_commits: Option<bool>,
    pub include_unmerged: Option<bool>,
}

impl RangeParts {
    pub fn into_spec(self, defaults: &RangeDefaults) -> Result<RangeSpec> {
        let mut modes = Vec::new();
        if self.count.is_some() {
            modes.push("count");
        }
        if self.since.is_some() || self.until.is_some() {
            modes.push("date");
        }
        if self.from_tag.is_some() || self.to_tag.is_some() {
            modes.push("tag");
        }
        if self.from_sha.is_some() || self.to_sha.is_some() {
            modes.push("sha");
        }
        if self.from_branch.is_some() || self.to_branch.is_some() {
            modes.push("branch");
        }

        if modes.len() > 1 {
            return Err(Error::range(
                modes.join("+"),
                "conflicting range selections, pick exactly one mode",
            ));
        }

        let Some(mode) = modes.first() else {
            return Ok(RangeSpec::Count(defaults.count));
        };

        match *mode {
            "count" => match self.count {
                Some(0) => Err(Error::range("count", "commit count must be at least 1")),
                Some(n) => Ok(RangeSpec::Count(n)),
                None => Ok(RangeSpec::Count(defaults.count)),
            },
            "date" => {
                let from = self
                    .since
                    .ok_or_else(|| Error::range("until", "an end date needs a start date"))?;
                Ok(RangeSpec::Dates {
                    from,
                    to: self.until,
                })
            }
            "tag" => {
                let from = self
                    .from_tag
                    .ok_or_else(|| Error::range("to-tag", "an end tag needs a start tag"))?;
                Ok(RangeSpec::Tags {
                    from,
                    to: self.to_tag,
                })
            }
            "sha" => {
                let from = self
                    .from_sha
                    .ok_or_else(|| Error::range("to-sha", "an end commit needs a start commit"))?;
                Ok(RangeSpec::Shas {
                    from,
                    to: self.to_sha,
                })
            }
            _ => {
                let to = self.to_branch.ok_or_else(|| {
                    Error::range("from-branch", "branch comparison needs a target branch")
                })?;
                let from = self
                    .from_branch
                    .unwrap_or_else(|| defaults.base_branch.clone());
                Ok(RangeSpec::Branches(BranchComparison {
                    from,
                    to,
                    strategy: self.strategy.unwrap_or(defaults.strategy),
                    include_merge_commits: self
                        .include_merge_commits
                        .unwrap_or(defaults.include_merge_commits),
                    include_unmerged: self.include_unmerged.unwrap_or(defaults.include_unmerged),
                }))
            }
        }
    }
}
