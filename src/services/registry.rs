// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::collections::BTreeMap;

use secrecy::SecretString;
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::{ProviderDescriptor, ProviderKind, UsageStats};
use crate::error::{Error, Result};
use crate::services::llm::{self, ChangelogProvider, OfflineProvider, ProviderSettings};
use crate::services::secrets::SecretStore;

/// Provider slots plus the primary/fallback designation.
///
/// The offline provider is held outside the map so [`select`](Self::select)
/// has something to return no matter what state the hosted slots are in.
pub struct ProviderRegistry {
    slots: BTreeMap<ProviderKind, Box<dyn ChangelogProvider>>,
    offline: OfflineProvider,
    primary: ProviderKind,
    fallback: Option<ProviderKind>,
}

impl ProviderRegistry {
    /// One unconfigured slot per hosted backend, built from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let mut slots = BTreeMap::new();
        for kind in ProviderKind::HOSTED {
            slots.insert(kind, llm::create_provider(kind, config)?);
        }

        Ok(Self {
            slots,
            offline: OfflineProvider::new(),
            primary: config.primary_provider,
            fallback: config.fallback_provider,
        })
    }

    /// A registry with no hosted slots at all. Selection always lands on the
    /// offline provider until something is registered.
    pub fn empty() -> Self {
        Self {
            slots: BTreeMap::new(),
            offline: OfflineProvider::new(),
            primary: ProviderKind::Offline,
            fallback: None,
        }
    }

    /// Put `provider` in its slot, replacing whatever was there.
    pub fn register(&mut self, provider: Box<dyn ChangelogProvider>) {
        let kind = provider.kind();
        if kind == ProviderKind::Offline {
            debug!("offline provider is built in, ignoring registration");
            return;
        }
        self.slots.insert(kind, provider);
    }

    /// Initialize every hosted slot with whatever `store` holds for it.
    ///
    /// A stored credential that fails validation is reported and the slot
    /// stays unconfigured; loading never makes the registry unusable.
    pub async fn load_credentials(&mut self, store: &dyn SecretStore) -> Result<()> {
        for (kind, provider) in self.slots.iter_mut() {
            let credential = match store.get(*kind).await {
                Ok(credential) => credential,
                Err(e) => {
                    warn!(provider = %kind, error = %e, "could not read credential");
                    continue;
                }
            };
            let Some(credential) = credential else {
                debug!(provider = %kind, "no credential stored");
                continue;
            };

            if let Err(e) = provider.initialize(ProviderSettings {
                credential: Some(credential),
                ..Default::default()
            }) {
                warn!(provider = %kind, error = %e, "ignoring stored credential");
            }
        }
        Ok(())
    }

    fn slot_mut(&mut self, kind: ProviderKind) -> Result<&mut Box<dyn ChangelogProvider>> {
        self.slots.get_mut(&kind).ok_or_else(|| {
            Error::Config(format!("{kind} does not take a credential or model"))
        })
    }

    /// Re-run the slot's `initialize` with a new credential. Other slots are
    /// left alone.
    pub fn set_credential(&mut self, kind: ProviderKind, credential: SecretString) -> Result<()> {
        self.slot_mut(kind)?.initialize(ProviderSettings {
            credential: Some(credential),
            ..Default::default()
        })?;
        debug!(provider = %kind, "credential updated");
        Ok(())
    }

    pub fn set_model(&mut self, kind: ProviderKind, model: &str) -> Result<()> {
        if kind == ProviderKind::Offline {
            return Ok(());
        }
        self.slot_mut(kind)?.initialize(ProviderSettings {
            model: Some(model.to_string()),
            ..Default::default()
        })
    }

    pub fn set_primary(&mut self, kind: ProviderKind) {
        self.primary = kind;
    }

    pub fn set_fallback(&mut self, kind: Option<ProviderKind>) {
        self.fallback = kind;
    }

    pub fn primary(&self) -> ProviderKind {
        self.primary
    }

    pub fn fallback(&self) -> Option<ProviderKind> {
        self.fallback
    }

    fn configured(&self, kind: ProviderKind) -> Option<&dyn ChangelogProvider> {
        if kind == ProviderKind::Offline {
            return Some(&self.offline);
        }
        self.slots
            .get(&kind)
            .map(|p| &**p)
            .filter(|p| p.is_configured())
    }

    /// Primary if configured, else fallback if configured, else offline.
    pub fn select(&self) -> &dyn ChangelogProvider {
        if let Some(provider) = self.configured(self.primary) {
            return provider;
        }
        if let Some(provider) = self.fallback.and_then(|kind| self.configured(kind)) {
            debug!(
                primary = %self.primary,
                fallback = %provider.kind(),
                "primary provider not configured, using fallback"
            );
            return provider;
        }
        debug!("no hosted provider configured, using offline heuristics");
        &self.offline
    }

    /// The provider in `kind`'s slot, configured or not.
    pub fn provider(&self, kind: ProviderKind) -> Option<&dyn ChangelogProvider> {
        if kind == ProviderKind::Offline {
            return Some(&self.offline);
        }
        self.slots.get(&kind).map(|p| &**p)
    }

    /// One descriptor per slot, offline last.
    pub fn statuses(&self) -> Vec<ProviderDescriptor> {
        self.slots
            .values()
            .map(|p| p.descriptor())
            .chain(std::iter::once(self.offline.descriptor()))
            .collect()
    }

    pub fn usage(&self) -> BTreeMap<ProviderKind, UsageStats> {
        self.slots
            .iter()
            .map(|(kind, p)| (*kind, p.usage()))
            .chain(std::iter::once((ProviderKind::Offline, self.offline.usage())))
            .collect()
    }
}
