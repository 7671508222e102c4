// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::domain::ProviderKind;
use crate::error::{Error, Result};

#[cfg(feature = "secure-storage")]
const KEYRING_SERVICE: &str = "changewise";

/// Where provider credentials live. Keyed by provider.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, provider: ProviderKind) -> Result<Option<SecretString>>;

    async fn store(&self, provider: ProviderKind, credential: SecretString) -> Result<()>;
}

/// In-process store, for tests and embedding.
#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<ProviderKind, SecretString>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(provider: ProviderKind, credential: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider, SecretString::from(credential.to_string()));
        store
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, provider: ProviderKind) -> Result<Option<SecretString>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .get(&provider)
            .map(|s| SecretString::from(s.expose_secret().to_string())))
    }

    async fn store(&self, provider: ProviderKind, credential: SecretString) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider, credential);
        Ok(())
    }
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Read-only store over environment variables:
/// `CHANGEWISE_<PROVIDER>_API_KEY`, then the vendor's own variable.
pub struct EnvSecretStore {
    lookup: Lookup,
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self {
            lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }
}

impl EnvSecretStore {
    /// Resolve variables through `lookup` instead of the process environment.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn variables(provider: ProviderKind) -> Vec<String> {
        let mut names = vec![format!(
            "CHANGEWISE_{}_API_KEY",
            provider.as_str().to_uppercase()
        )];
        if let Some(vendor) = provider.vendor_env_var() {
            names.push(vendor.to_string());
        }
        names
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, provider: ProviderKind) -> Result<Option<SecretString>> {
        if !provider.is_hosted() {
            return Ok(None);
        }
        Ok(Self::variables(provider)
            .iter()
            .find_map(|name| (self.lookup)(name).filter(|v| !v.trim().is_empty()))
            .map(SecretString::from))
    }

    async fn store(&self, provider: ProviderKind, _credential: SecretString) -> Result<()> {
        Err(Error::Config(format!(
            "environment credentials are read-only, export {} instead",
            Self::variables(provider).join(" or ")
        )))
    }
}

/// Platform keychain through the `keyring` crate.
#[cfg(feature = "secure-storage")]
#[derive(Default)]
pub struct KeyringSecretStore;

#[cfg(feature = "secure-storage")]
#[async_trait]
impl SecretStore for KeyringSecretStore {
    async fn get(&self, provider: ProviderKind) -> Result<Option<SecretString>> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, provider.as_str())
            .map_err(|e| Error::Keyring(e.to_string()))?;
        match entry.get_password() {
            Ok(key) => Ok(Some(SecretString::from(key))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Keyring(e.to_string())),
        }
    }

    async fn store(&self, provider: ProviderKind, credential: SecretString) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, provider.as_str())
            .map_err(|e| Error::Keyring(e.to_string()))?;
        entry
            .set_password(credential.expose_secret())
            .map_err(|e| Error::Keyring(e.to_string()))
    }
}

/// Environment first, then the keychain. Writes go to the keychain.
#[derive(Default)]
pub struct LayeredSecretStore {
    env: EnvSecretStore,
    #[cfg(feature = "secure-storage")]
    keyring: KeyringSecretStore,
}

impl LayeredSecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for LayeredSecretStore {
    async fn get(&self, provider: ProviderKind) -> Result<Option<SecretString>> {
        if let Some(key) = self.env.get(provider).await? {
            debug!(provider = %provider, "credential from environment");
            return Ok(Some(key));
        }

        #[cfg(feature = "secure-storage")]
        if provider.is_hosted() {
            match self.keyring.get(provider).await {
                Ok(Some(key)) => {
                    debug!(provider = %provider, "credential from keychain");
                    return Ok(Some(key));
                }
                Ok(None) => {}
                Err(e) => warn!(provider = %provider, error = %e, "keychain lookup failed"),
            }
        }

        Ok(None)
    }

    async fn store(&self, provider: ProviderKind, credential: SecretString) -> Result<()> {
        #[cfg(feature = "secure-storage")]
        {
            self.keyring.store(provider, credential).await
        }

        #[cfg(not(feature = "secure-storage"))]
        {
            self.env.store(provider, credential).await
        }
    }
}
