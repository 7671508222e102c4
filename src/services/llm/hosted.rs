// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::{
    ChangelogProvider, Completion, CompletionRequest, ProviderSettings, anthropic, gemini,
    openai, connectivity_commit,
};
use crate::domain::{
    ChangeType, ChangelogEntry, CommitRecord, ProviderDescriptor, ProviderKind, UsageStats,
    WritingStyle,
};
use crate::error::{Error, Result};
use crate::services::heuristic;
use crate::services::prompt::{self, Prompt};
use crate::services::response::ResponseParser;

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const MIN_CREDENTIAL_LEN: usize = 8;

/// Check a raw credential for `kind`. Blank means "no credential"; anything
/// else must look like a token. Returns the trimmed value.
pub fn validate_credential(kind: ProviderKind, raw: &str) -> Result<Option<SecretString>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = |reason: &str| Error::InvalidCredential {
        provider: kind.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("credential contains whitespace or control characters"));
    }
    if trimmed.chars().count() < MIN_CREDENTIAL_LEN {
        return Err(invalid("credential is too short"));
    }
    if let Some(prefix) = kind.key_prefix()
        && !trimmed.starts_with(prefix)
    {
        warn!(
            provider = %kind,
            expected_prefix = prefix,
            "credential has an unusual shape, keeping it for compatible gateways"
        );
    }

    Ok(Some(SecretString::from(trimmed.to_string())))
}

/// A text-generation backend reached over HTTP. Which wire format is used
/// depends on `kind`; everything else (prompting, parsing, fallback) is the
/// same for all of them.
pub struct HostedProvider {
    kind: ProviderKind,
    client: Client,
    base_url: String,
    model: String,
    credential: Option<SecretString>,
    temperature: f32,
    max_tokens: u32,
    usage: Mutex<UsageStats>,
}

impl HostedProvider {
    /// An unconfigured provider for `kind`. `kind` must be a hosted kind;
    /// `Offline` is served by [`super::OfflineProvider`].
    pub fn new(kind: ProviderKind, base_url: Option<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        let base_url = base_url
            .unwrap_or_else(|| Self::default_base_url(kind).to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            kind,
            client,
            base_url,
            model: kind.default_model().to_string(),
            credential: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            usage: Mutex::new(UsageStats::default()),
        }
    }

    pub fn with_defaults(kind: ProviderKind) -> Self {
        Self::new(kind, None, DEFAULT_TIMEOUT_SECS)
    }

    fn default_base_url(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::Anthropic => anthropic::DEFAULT_BASE_URL,
            ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
            ProviderKind::OpenAI | ProviderKind::Offline => openai::DEFAULT_BASE_URL,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One round trip to the backend. Counts towards usage whether or not it
    /// succeeds.
    async fn complete(&self, prompt: &Prompt, json: bool) -> Result<Completion> {
        let Some(credential) = self.credential.as_ref() else {
            return Err(Error::provider(self.kind.as_str(), "no credential configured"));
        };

        let request = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json,
        };
        let key = credential.expose_secret();

        let result = match self.kind {
            ProviderKind::OpenAI => openai::complete(&self.client, &self.base_url, key, &request).await,
            ProviderKind::Anthropic => {
                anthropic::complete(&self.client, &self.base_url, key, &request).await
            }
            ProviderKind::Gemini => gemini::complete(&self.client, &self.base_url, key, &request).await,
            ProviderKind::Offline => Err(Error::provider(
                self.kind.as_str(),
                "offline is not a hosted backend",
            )),
        };

        let tokens = result.as_ref().map_or(0, |c| c.tokens);
        self.usage
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record(tokens);

        result
    }

    fn log_fallback(&self, commit: &CommitRecord, error: &Error) {
        // Error::Provider messages are redacted on construction.
        warn!(
            provider = %self.kind,
            commit = commit.short_id(),
            error = %error,
            "backend call failed, using local heuristic"
        );
    }

    fn fallback_entry(commit: &CommitRecord) -> ChangelogEntry {
        ChangelogEntry::new(
            heuristic::classify(&commit.message),
            heuristic::clean_description(&commit.message),
            commit.clone(),
        )
    }
}

#[async_trait]
impl ChangelogProvider for HostedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn initialize(&mut self, settings: ProviderSettings) -> Result<()> {
        // Validate before touching any field so a rejected credential leaves
        // the slot as it was.
        let credential = match settings.credential {
            Some(raw) => Some(validate_credential(self.kind, raw.expose_secret())?),
            None => None,
        };

        if let Some(model) = settings.model.filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        if let Some(tokens) = settings.max_output_tokens {
            self.max_tokens = tokens;
        }
        if let Some(temperature) = settings.temperature {
            self.temperature = temperature;
        }

        if let Some(credential) = credential {
            self.credential = credential;
        }

        debug!(
            provider = %self.kind,
            model = %self.model,
            configured = self.credential.is_some(),
            "provider initialized"
        );
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    async fn classify(&self, commit: &CommitRecord) -> ChangeType {
        if let Some((ty, _)) = heuristic::conventional_prefix(&commit.message) {
            return ty;
        }
        if !self.is_configured() {
            return heuristic::classify(&commit.message);
        }

        let prompt = prompt::classify_prompt(commit, WritingStyle::default());
        match self.complete(&prompt, true).await {
            Ok(c) => match ResponseParser::classification(&c.text) {
                Some(parsed) => parsed.change_type,
                None => {
                    debug!(provider = %self.kind, "unusable classification, using heuristic");
                    heuristic::classify(&commit.message)
                }
            },
            Err(e) => {
                self.log_fallback(commit, &e);
                heuristic::classify(&commit.message)
            }
        }
    }

    async fn enhance(&self, commit: &CommitRecord, style: WritingStyle) -> String {
        if heuristic::is_well_formed(&commit.message) {
            return commit.message.clone();
        }
        if !self.is_configured() {
            return heuristic::clean_description(&commit.message);
        }

        let prompt = prompt::enhance_prompt(commit, style);
        match self.complete(&prompt, false).await {
            Ok(c) => ResponseParser::description(&c.text)
                .unwrap_or_else(|| heuristic::clean_description(&commit.message)),
            Err(e) => {
                self.log_fallback(commit, &e);
                heuristic::clean_description(&commit.message)
            }
        }
    }

    async fn entry(&self, commit: &CommitRecord, style: WritingStyle) -> ChangelogEntry {
        let declared = heuristic::conventional_prefix(&commit.message).map(|(ty, _)| ty);

        if heuristic::is_well_formed(&commit.message)
            && let Some(ty) = declared
        {
            return ChangelogEntry::new(ty, commit.message.clone(), commit.clone());
        }
        if !self.is_configured() {
            return Self::fallback_entry(commit);
        }

        let prompt = prompt::classify_prompt(commit, style);
        match self.complete(&prompt, true).await {
            Ok(c) => match ResponseParser::classification(&c.text) {
                Some(parsed) => ChangelogEntry::new(
                    declared.unwrap_or(parsed.change_type),
                    parsed.description,
                    commit.clone(),
                ),
                None => {
                    debug!(
                        provider = %self.kind,
                        commit = commit.short_id(),
                        "unusable classification, using heuristic"
                    );
                    Self::fallback_entry(commit)
                }
            },
            Err(e) => {
                self.log_fallback(commit, &e);
                Self::fallback_entry(commit)
            }
        }
    }

    async fn summarize(&self, entries: &[ChangelogEntry], style: WritingStyle) -> String {
        if entries.is_empty() || !self.is_configured() {
            return heuristic::summary_template(entries);
        }

        let prompt = prompt::summary_prompt(entries, style);
        match self.complete(&prompt, false).await {
            Ok(c) => ResponseParser::summary(&c.text)
                .unwrap_or_else(|| heuristic::summary_template(entries)),
            Err(e) => {
                warn!(provider = %self.kind, error = %e, "summary failed, using template");
                heuristic::summary_template(entries)
            }
        }
    }

    async fn test_connection(&self) -> Result<()> {
        let prompt = prompt::classify_prompt(&connectivity_commit(), WritingStyle::default());
        let completion = self.complete(&prompt, true).await?;
        if ResponseParser::classification(&completion.text).is_none() {
            debug!(provider = %self.kind, "connectivity check answered, but not in the requested format");
        }
        Ok(())
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: self.kind,
            available_models: self
                .kind
                .available_models()
                .iter()
                .map(|m| m.to_string())
                .collect(),
            default_model: self.kind.default_model().to_string(),
            model: self.model.clone(),
            configured: self.is_configured(),
        }
    }

    fn usage(&self) -> UsageStats {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
