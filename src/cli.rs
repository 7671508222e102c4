// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::domain::{ChangeType, ComparisonStrategy, ProviderKind, RangeParts, WritingStyle};

#[derive(Parser, Debug)]
#[command(name = "changewise")]
#[command(version)]
#[command(about = "Release notes from git history, rewritten by an LLM", long_about = None)]
pub struct Cli {
    /// Repository to read (defaults to the current directory)
    #[arg(short, long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Writing style (formal, dev-friendly, pm-style)
    #[arg(short, long, global = true, env = "CHANGEWISE_STYLE")]
    pub style: Option<WritingStyle>,

    /// Primary provider for this run (openai, anthropic, gemini, offline)
    #[arg(short, long, global = true)]
    pub provider: Option<ProviderKind>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate release notes and write them to the output file
    Generate(GenerateArgs),
    /// Generate release notes and print them without writing anything
    Preview(GenerateArgs),
    /// Show every provider and whether it is configured
    Providers,
    /// Run a test classification against one provider
    Test {
        /// Provider name
        provider: ProviderKind,
    },
    /// Store an API key in the system keychain
    #[cfg(feature = "secure-storage")]
    SetKey {
        /// Provider name (openai, anthropic, gemini)
        provider: ProviderKind,
    },
    /// Check whether an API key is available for a provider
    GetKey {
        /// Provider name (openai, anthropic, gemini)
        provider: ProviderKind,
    },
    /// Set the primary provider
    SetPrimary { provider: ProviderKind },
    /// Set the fallback provider, or `none` to disable it
    SetFallback {
        #[arg(id = "fallback_provider", value_name = "PROVIDER")]
        provider: FallbackTarget,
    },
    /// Set the model used by a provider
    SetModel {
        provider: ProviderKind,
        model: String,
    },
    /// Show configuration, or change one key
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Initialize config file
    Init,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Argument of `set-fallback`: a provider name or `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackTarget(pub Option<ProviderKind>);

impl FallbackTarget {
    pub fn as_str(&self) -> &'static str {
        self.0.map_or("none", |kind| kind.as_str())
    }
}

impl std::fmt::Display for FallbackTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FallbackTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("none") {
            return Ok(Self(None));
        }
        s.parse().map(|kind| Self(Some(kind)))
    }
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Write one key to the user config file
    Set { key: String, value: String },
}

#[derive(Args, Debug, Default, Clone)]
pub struct GenerateArgs {
    /// Number of most recent commits
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Start date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub since: Option<String>,

    /// End date, defaults to now
    #[arg(long)]
    pub until: Option<String>,

    #[arg(long)]
    pub from_tag: Option<String>,

    /// Defaults to HEAD
    #[arg(long)]
    pub to_tag: Option<String>,

    #[arg(long)]
    pub from_sha: Option<String>,

    /// Defaults to HEAD
    #[arg(long)]
    pub to_sha: Option<String>,

    /// Base branch, defaults to `base_branch` from config
    #[arg(long)]
    pub from_branch: Option<String>,

    #[arg(long)]
    pub to_branch: Option<String>,

    /// Branch comparison strategy (one-way, symmetric, merge-base)
    #[arg(long)]
    pub strategy: Option<ComparisonStrategy>,

    /// Keep merge commits
    #[arg(long)]
    pub include_merges: bool,

    /// With --strategy symmetric, drop commits that only exist on the base branch
    #[arg(long)]
    pub exclude_unmerged: bool,

    /// Only keep these types (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub types: Vec<ChangeType>,

    /// Drop style-only commits
    #[arg(long)]
    pub skip_formatting: bool,

    /// Group entries by author instead of by type
    #[arg(long)]
    pub group_by_author: bool,

    /// Output file (generate only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl GenerateArgs {
    pub fn range_parts(&self) -> RangeParts {
        RangeParts {
            count: self.count,
            since: self.since.clone(),
            until: self.until.clone(),
            from_tag: self.from_tag.clone(),
            to_tag: self.to_tag.clone(),
            from_sha: self.from_sha.clone(),
            to_sha: self.to_sha.clone(),
            from_branch: self.from_branch.clone(),
            to_branch: self.to_branch.clone(),
            strategy: self.strategy,
            include_merge_commits: self.include_merges.then_some(true),
            include_unmerged: self.exclude_unmerged.then_some(false),
        }
    }
}
