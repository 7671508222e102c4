// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use async_trait::async_trait;

use super::{ChangelogProvider, ProviderSettings};
use crate::domain::{
    ChangeType, ChangelogEntry, CommitRecord, ProviderDescriptor, ProviderKind, UsageStats,
    WritingStyle,
};
use crate::error::Result;
use crate::services::heuristic;

/// Deterministic provider that never leaves the process. Always configured,
/// so the registry can fall back to it unconditionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChangelogProvider for OfflineProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Offline
    }

    fn initialize(&mut self, _settings: ProviderSettings) -> Result<()> {
        Ok(())
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn classify(&self, commit: &CommitRecord) -> ChangeType {
        heuristic::classify_with_diff(&commit.message, &commit.diff)
    }

    async fn enhance(&self, commit: &CommitRecord, _style: WritingStyle) -> String {
        if heuristic::is_well_formed(&commit.message) {
            return commit.message.clone();
        }
        heuristic::clean_description(&commit.message)
    }

    async fn entry(&self, commit: &CommitRecord, style: WritingStyle) -> ChangelogEntry {
        ChangelogEntry::new(
            self.classify(commit).await,
            self.enhance(commit, style).await,
            commit.clone(),
        )
    }

    async fn summarize(&self, entries: &[ChangelogEntry], _style: WritingStyle) -> String {
        heuristic::summary_template(entries)
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            name: ProviderKind::Offline,
            available_models: ProviderKind::Offline
                .available_models()
                .iter()
                .map(|m| m.to_string())
                .collect(),
            default_model: ProviderKind::Offline.default_model().to_string(),
            model: ProviderKind::Offline.default_model().to_string(),
            configured: true,
        }
    }

    fn usage(&self) -> UsageStats {
        UsageStats::default()
    }
}
