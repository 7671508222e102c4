// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use reqwest::RequestBuilder;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::debug;

pub mod anthropic;
pub mod gemini;
pub mod hosted;
pub mod offline;
pub mod openai;

pub use hosted::{HostedProvider, validate_credential};
pub use offline::OfflineProvider;

use crate::config::Config;
use crate::domain::{
    ChangeType, ChangelogEntry, CommitRecord, ProviderDescriptor, ProviderKind, UsageStats,
    WritingStyle,
};
use crate::error::{Error, Result};
use crate::services::prompt::Prompt;

/// Commits handled per batch. Batches and the commits inside them run one
/// after another.
pub const BATCH_SIZE: usize = 5;

/// Input to [`ChangelogProvider::initialize`]. Unset fields keep the
/// provider's current values; a blank credential clears it.
#[derive(Debug, Default)]
pub struct ProviderSettings {
    pub credential: Option<SecretString>,
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// One backend capable of classifying and describing commits.
///
/// Only `initialize` and `test_connection` can fail. Everything else
/// degrades to the local heuristic internally and always produces a value.
#[async_trait]
pub trait ChangelogProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// (Re)configure the provider. A blank credential leaves it unconfigured
    /// without error; a malformed one is rejected and changes nothing.
    fn initialize(&mut self, settings: ProviderSettings) -> Result<()>;

    fn is_configured(&self) -> bool;

    async fn classify(&self, commit: &CommitRecord) -> ChangeType;

    async fn enhance(&self, commit: &CommitRecord, style: WritingStyle) -> String;

    /// Category and description for one commit.
    async fn entry(&self, commit: &CommitRecord, style: WritingStyle) -> ChangelogEntry;

    async fn classify_and_enhance(
        &self,
        commits: &[CommitRecord],
        style: WritingStyle,
    ) -> Vec<ChangelogEntry> {
        let mut entries = Vec::with_capacity(commits.len());
        let batches = commits.len().div_ceil(BATCH_SIZE);
        for (index, batch) in commits.chunks(BATCH_SIZE).enumerate() {
            debug!(
                provider = %self.kind(),
                batch = index + 1,
                of = batches,
                size = batch.len(),
                "processing batch"
            );
            for commit in batch {
                entries.push(self.entry(commit, style).await);
            }
        }
        entries
    }

    async fn summarize(&self, entries: &[ChangelogEntry], style: WritingStyle) -> String;

    /// Hit the backend with a fixed commit and report the raw outcome,
    /// without any fallback.
    async fn test_connection(&self) -> Result<()>;

    fn descriptor(&self) -> ProviderDescriptor;

    fn usage(&self) -> UsageStats;
}

/// Build an unconfigured provider for `kind` with the transport and sampling
/// settings from `config`. Credentials are supplied later via `initialize`.
pub fn create_provider(kind: ProviderKind, config: &Config) -> Result<Box<dyn ChangelogProvider>> {
    if kind == ProviderKind::Offline {
        return Ok(Box::new(OfflineProvider::new()));
    }

    let mut provider = HostedProvider::new(kind, config.base_url_for(kind), config.timeout_secs);
    provider.initialize(ProviderSettings {
        credential: None,
        model: Some(config.model_for(kind)),
        max_output_tokens: Some(config.max_output_tokens),
        temperature: Some(config.temperature),
    })?;
    Ok(Box::new(provider))
}

/// Fixed commit used by connectivity tests.
pub fn connectivity_commit() -> CommitRecord {
    CommitRecord {
        id: "0000000000000000000000000000000000000000".into(),
        message: "add health check endpoint".into(),
        author: "changewise".into(),
        timestamp: "2026-01-01T00:00:00+00:00".into(),
        diff: "+fn health() -> &'static str {\n+    \"ok\"\n+}\n".into(),
        parents: Vec::new(),
    }
}

/// What an adapter sends: the prompt plus sampling parameters.
#[derive(Debug)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a Prompt,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the backend for a JSON object when it supports that.
    pub json: bool,
}

/// What an adapter returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub tokens: u64,
}

/// Send a request and decode a JSON body, mapping transport and HTTP
/// failures onto redacted `Error::Provider` values.
pub(crate) async fn send_json<R: DeserializeOwned>(
    request: RequestBuilder,
    provider: ProviderKind,
) -> Result<R> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            Error::provider(provider.as_str(), "request timed out")
        } else {
            Error::provider(provider.as_str(), e.to_string())
        }
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::provider(
            provider.as_str(),
            format!("HTTP {status}: {body}"),
        ));
    }

    response
        .json::<R>()
        .await
        .map_err(|e| Error::provider(provider.as_str(), format!("malformed response: {e}")))
}
