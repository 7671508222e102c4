// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::collections::BTreeMap;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{
    ChangeType, ChangelogEntry, CommitRecord, ConnectivityReport, ProviderDescriptor,
    ProviderKind, UsageStats, WritingStyle,
};
use crate::error::{Error, Result};
use crate::services::llm::{BATCH_SIZE, validate_credential};
use crate::services::registry::ProviderRegistry;
use crate::services::secrets::SecretStore;

/// Entry point for everything provider-related.
///
/// Nothing here remembers which provider answered last time: each call asks
/// the registry again, so a credential or designation change applies to the
/// very next call.
pub struct Orchestrator {
    registry: RwLock<ProviderRegistry>,
    secrets: Arc<dyn SecretStore>,
}

impl Orchestrator {
    pub fn new(registry: ProviderRegistry, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            registry: RwLock::new(registry),
            secrets,
        }
    }

    /// Registry built from `config` with credentials pulled from `secrets`.
    pub async fn from_config(config: &Config, secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let mut registry = ProviderRegistry::new(config)?;
        registry.load_credentials(secrets.as_ref()).await?;
        Ok(Self::new(registry, secrets))
    }

    /// Which provider the next call would use.
    pub async fn active_provider(&self) -> ProviderKind {
        self.registry.read().await.select().kind()
    }

    pub async fn process(
        &self,
        commits: &[CommitRecord],
        style: WritingStyle,
    ) -> Vec<ChangelogEntry> {
        self.process_with_progress(commits, style, |_| {}).await
    }

    /// Like [`process`](Self::process), calling `progress` with the number
    /// of commits finished after each batch.
    pub async fn process_with_progress(
        &self,
        commits: &[CommitRecord],
        style: WritingStyle,
        progress: impl Fn(usize) + Send + Sync,
    ) -> Vec<ChangelogEntry> {
        let registry = self.registry.read().await;
        let provider = registry.select();
        info!(
            provider = %provider.kind(),
            commits = commits.len(),
            "classifying commits"
        );

        let mut entries = Vec::with_capacity(commits.len());
        for batch in commits.chunks(BATCH_SIZE) {
            entries.extend(provider.classify_and_enhance(batch, style).await);
            progress(entries.len());
        }
        entries
    }

    pub async fn summarize(&self, entries: &[ChangelogEntry], style: WritingStyle) -> String {
        let registry = self.registry.read().await;
        registry.select().summarize(entries, style).await
    }

    pub async fn classify(&self, commit: &CommitRecord) -> ChangeType {
        let registry = self.registry.read().await;
        registry.select().classify(commit).await
    }

    pub async fn enhance(&self, commit: &CommitRecord, style: WritingStyle) -> String {
        let registry = self.registry.read().await;
        registry.select().enhance(commit, style).await
    }

    /// Probe one backend directly, bypassing selection and fallback.
    pub async fn test_connectivity(&self, kind: ProviderKind) -> ConnectivityReport {
        let registry = self.registry.read().await;
        let Some(provider) = registry.provider(kind) else {
            return ConnectivityReport {
                provider: kind,
                success: false,
                error: Some("provider is not registered".into()),
            };
        };
        if !provider.is_configured() {
            return ConnectivityReport {
                provider: kind,
                success: false,
                error: Some("no credential configured".into()),
            };
        }

        let outcome = provider.test_connection().await;
        debug!(provider = %kind, success = outcome.is_ok(), "connectivity test finished");
        ConnectivityReport {
            provider: kind,
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    pub async fn provider_statuses(&self) -> Vec<ProviderDescriptor> {
        self.registry.read().await.statuses()
    }

    pub async fn usage_statistics(&self) -> BTreeMap<ProviderKind, UsageStats> {
        self.registry.read().await.usage()
    }

    /// Validate and persist a credential, then apply it. The registry only
    /// changes once the store has accepted the value.
    pub async fn set_credential(&self, kind: ProviderKind, credential: SecretString) -> Result<()> {
        if !kind.is_hosted() {
            return Err(Error::Config(format!("{kind} does not take a credential")));
        }

        let Some(validated) = validate_credential(kind, credential.expose_secret())? else {
            return Err(Error::Config("API key cannot be empty".into()));
        };
        self.secrets.store(kind, validated.clone()).await?;
        self.registry.write().await.set_credential(kind, validated)?;
        info!(provider = %kind, "credential stored");
        Ok(())
    }

    pub async fn credential(&self, kind: ProviderKind) -> Result<Option<SecretString>> {
        self.secrets.get(kind).await
    }

    pub async fn set_primary(&self, kind: ProviderKind) {
        self.registry.write().await.set_primary(kind);
    }

    pub async fn set_fallback(&self, kind: Option<ProviderKind>) {
        self.registry.write().await.set_fallback(kind);
    }

    pub async fn set_model(&self, kind: ProviderKind, model: &str) -> Result<()> {
        self.registry.write().await.set_model(kind, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::secrets::{EnvSecretStore, MemorySecretStore};

    fn commit(id: &str, message: &str) -> CommitRecord {
        CommitRecord {
            id: id.into(),
            message: message.into(),
            author: "Dev".into(),
            timestamp: "2026-03-01T10:00:00+00:00".into(),
            diff: String::new(),
            parents: vec!["p".into()],
        }
    }

    async fn orchestrator() -> Orchestrator {
        Orchestrator::from_config(&Config::default(), Arc::new(MemorySecretStore::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unconfigured_classify_uses_prefix() {
        let orchestrator = orchestrator().await;
        let ty = orchestrator.classify(&commit("a1", "feat: add login")).await;
        assert_eq!(ty, ChangeType::Feat);
        assert_eq!(orchestrator.active_provider().await, ProviderKind::Offline);
    }

    #[tokio::test]
    async fn progress_reports_each_batch() {
        let orchestrator = orchestrator().await;
        let commits: Vec<_> = (0..11)
            .map(|i| commit(&format!("c{i}"), "fix: thing"))
            .collect();
        let seen = std::sync::Mutex::new(Vec::new());
        let entries = orchestrator
            .process_with_progress(&commits, WritingStyle::Formal, |n| {
                seen.lock().unwrap().push(n)
            })
            .await;
        assert_eq!(entries.len(), 11);
        assert_eq!(*seen.lock().unwrap(), vec![5, 10, 11]);
    }

    #[tokio::test]
    async fn credential_change_applies_to_next_call() {
        let orchestrator = orchestrator().await;
        assert_eq!(orchestrator.active_provider().await, ProviderKind::Offline);

        orchestrator
            .set_credential(
                ProviderKind::Anthropic,
                SecretString::from("sk-ant-test-0123456789"),
            )
            .await
            .unwrap();
        assert_eq!(orchestrator.active_provider().await, ProviderKind::Anthropic);

        let stored = orchestrator
            .credential(ProviderKind::Anthropic)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.expose_secret(), "sk-ant-test-0123456789");
    }

    #[tokio::test]
    async fn rejected_credential_is_not_stored() {
        let orchestrator = orchestrator().await;
        let result = orchestrator
            .set_credential(ProviderKind::OpenAI, SecretString::from("abc"))
            .await;
        assert!(matches!(result, Err(Error::InvalidCredential { .. })));
        assert!(
            orchestrator
                .credential(ProviderKind::OpenAI)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn failed_store_leaves_registry_untouched() {
        let orchestrator = Orchestrator::from_config(
            &Config::default(),
            Arc::new(EnvSecretStore::with_lookup(|_| None)),
        )
        .await
        .unwrap();

        let result = orchestrator
            .set_credential(ProviderKind::OpenAI, SecretString::from("sk-test-0123456789"))
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(orchestrator.active_provider().await, ProviderKind::Offline);

        let openai = orchestrator
            .provider_statuses()
            .await
            .into_iter()
            .find(|d| d.name == ProviderKind::OpenAI)
            .unwrap();
        assert!(!openai.configured);
    }

    #[tokio::test]
    async fn blank_credential_is_rejected() {
        let orchestrator = orchestrator().await;
        let result = orchestrator
            .set_credential(ProviderKind::Gemini, SecretString::from("   "))
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(orchestrator.credential(ProviderKind::Gemini).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stored_credential_is_trimmed() {
        let orchestrator = orchestrator().await;
        orchestrator
            .set_credential(ProviderKind::OpenAI, SecretString::from("  sk-test-0123456789\n"))
            .await
            .unwrap();
        let stored = orchestrator
            .credential(ProviderKind::OpenAI)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.expose_secret(), "sk-test-0123456789");
    }

    #[tokio::test]
    async fn unconfigured_connectivity_reports_failure() {
        let orchestrator = orchestrator().await;
        let report = orchestrator.test_connectivity(ProviderKind::Gemini).await;
        assert!(!report.success);
        assert!(report.error.is_some());

        let offline = orchestrator.test_connectivity(ProviderKind::Offline).await;
        assert!(offline.success);
    }
}
