// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

// miette's Diagnostic derive generates code that triggers this false positive
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error("Not a usable git repository: {path} ({message})")]
    #[diagnostic(
        code(changewise::git::not_repo),
        help("Point --repo at a directory inside a git repository")
    )]
    Repository { path: String, message: String },

    #[error("Invalid range '{reference}': {message}")]
    #[diagnostic(
        code(changewise::git::range),
        help("Check the name with: git branch -a / git tag --list")
    )]
    Range { reference: String, message: String },

    #[error("Provider '{provider}' error: {message}")]
    #[diagnostic(code(changewise::provider::error))]
    Provider { provider: String, message: String },

    #[error("Invalid credential for '{provider}': {reason}")]
    #[diagnostic(
        code(changewise::provider::credential),
        help("Store a new key with: changewise set-key {provider}")
    )]
    InvalidCredential { provider: String, reason: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(changewise::config::error))]
    Config(String),

    #[error("Git error: {0}")]
    #[diagnostic(code(changewise::git::error))]
    Git(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),

    #[cfg(feature = "secure-storage")]
    #[error("Keyring error: {0}")]
    #[diagnostic(
        code(changewise::keyring::error),
        help("Check your system keychain configuration")
    )]
    Keyring(String),
}

impl Error {
    /// Build a `Range` error for a missing or malformed reference.
    pub fn range(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Range {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Build a `Provider` error. The message is redacted before it is stored,
    /// so the value is safe to log or display as-is.
    pub fn provider(provider: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: crate::services::safety::redact(message.as_ref()),
        }
    }
}

impl From<dialoguer::Error> for Error {
    fn from(e: dialoguer::Error) -> Self {
        Error::Dialog(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
