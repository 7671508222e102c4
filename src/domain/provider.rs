// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every backend the registry knows about. Adding a backend means adding a
/// variant here and an adapter under `services::llm`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAI,
    Anthropic,
    Gemini,
    Offline,
}

impl ProviderKind {
    pub const HOSTED: [ProviderKind; 3] = [Self::OpenAI, Self::Anthropic, Self::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Offline => "offline",
        }
    }

    pub fn is_hosted(&self) -> bool {
        !matches!(self, Self::Offline)
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Gemini => "gemini-1.5-flash",
            Self::Offline => "heuristic",
        }
    }

    pub fn available_models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAI => &["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini", "gpt-4.1"],
            Self::Anthropic => &[
                "claude-3-5-haiku-latest",
                "claude-3-5-sonnet-latest",
                "claude-sonnet-4-20250514",
            ],
            Self::Gemini => &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"],
            Self::Offline => &["heuristic"],
        }
    }

    /// Vendor environment variable conventionally holding the key.
    pub fn vendor_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Offline => None,
        }
    }

    /// Prefix real keys for this backend usually start with.
    pub fn key_prefix(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("sk-"),
            Self::Anthropic => Some("sk-ant-"),
            Self::Gemini => Some("AIza"),
            Self::Offline => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "offline" | "local" => Ok(Self::Offline),
            other => Err(format!(
                "unknown provider '{other}', expected openai, anthropic, gemini or offline"
            )),
        }
    }
}

/// Identity and readiness of one provider slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub name: ProviderKind,
    pub available_models: Vec<String>,
    pub default_model: String,
    pub model: String,
    pub configured: bool,
}

/// Per-provider counters for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub tokens_used: u64,
    pub requests_count: u64,
    pub last_request: Option<DateTime<Utc>>,
}

impl UsageStats {
    pub fn record(&mut self, tokens: u64) {
        self.tokens_used = self.tokens_used.saturating_add(tokens);
        self.requests_count = self.requests_count.saturating_add(1);
        self.last_request = Some(Utc::now());
    }
}

/// Outcome of a provider connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub provider: ProviderKind,
    pub success: bool,
    pub error: Option<String>,
}
