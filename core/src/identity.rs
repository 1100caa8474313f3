//! Credential verification.
//!
//! The marketplace consumes verified principals only; issuing tokens
//! (registration, login) happens elsewhere. [`StaticIdentityProvider`] serves
//! a fixed account table loaded at startup, with bearer tokens stored as
//! base64-encoded SHA-256 digests.
//!
//! Account file format:
//!
//! ```json
//! {
//!   "accounts": [
//!     {
//!       "id": "6f1c...",
//!       "role": "seller",
//!       "name": "Kennel Co",
//!       "email": "kennel@example.com",
//!       "contact": "+1 555 0100",
//!       "tokenSha256": "n4bQgYhMfWWaL+qgxVrQFaO/TxsrC4Is0V1sFbDwCgg="
//!     }
//!   ]
//! }
//! ```

use crate::memory::InMemoryUserDirectory;
use crate::types::{Principal, Role, UserId, UserProfile};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from identity operations.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The credential did not match any account
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account file could not be read
    #[error("failed to read accounts file: {0}")]
    Io(#[from] std::io::Error),

    /// The account file is malformed
    #[error("invalid accounts file: {0}")]
    Parse(String),
}

/// Verifies bearer credentials.
pub trait IdentityProvider: Send + Sync {
    /// Resolves a credential to a principal.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] if the token is unknown.
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Principal, IdentityError>> + Send + 'a>>;
}

/// SHA-256 digest of a bearer token.
#[must_use]
pub fn token_digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Base64 form of [`token_digest`], as stored in account files.
#[must_use]
pub fn encode_token_digest(token: &str) -> String {
    STANDARD.encode(token_digest(token))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    id: UserId,
    role: Role,
    name: String,
    email: String,
    #[serde(default)]
    contact: Option<String>,
    token_sha256: String,
}

#[derive(Debug, Deserialize)]
struct AccountFile {
    accounts: Vec<AccountRecord>,
}

/// A parsed account table.
#[derive(Clone, Debug, Default)]
pub struct AccountTable {
    entries: Vec<([u8; 32], UserProfile)>,
}

impl AccountTable {
    /// Parses an account table from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Parse`] on malformed JSON or a digest that is
    /// not 32 base64-encoded bytes.
    pub fn from_json(json: &str) -> Result<Self, IdentityError> {
        let file: AccountFile =
            serde_json::from_str(json).map_err(|e| IdentityError::Parse(e.to_string()))?;

        let entries = file
            .accounts
            .into_iter()
            .map(|record| {
                let digest: [u8; 32] = STANDARD
                    .decode(record.token_sha256.trim())
                    .ok()
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or_else(|| {
                        IdentityError::Parse(format!(
                            "account {}: tokenSha256 must be a base64 SHA-256 digest",
                            record.id
                        ))
                    })?;
                let profile = UserProfile {
                    id: record.id,
                    role: record.role,
                    name: record.name,
                    email: record.email,
                    contact: record.contact,
                };
                Ok((digest, profile))
            })
            .collect::<Result<Vec<_>, IdentityError>>()?;

        Ok(Self { entries })
    }

    /// Reads and parses an account file.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Io`] if the file cannot be read, or
    /// [`IdentityError::Parse`] if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IdentityError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let table = Self::from_json(&json)?;
        info!(path = %path.display(), accounts = table.len(), "Accounts loaded");
        Ok(table)
    }

    /// Adds an account verified by `token`.
    #[must_use]
    pub fn with_account(mut self, profile: UserProfile, token: &str) -> Self {
        self.entries.push((token_digest(token), profile));
        self
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Account profiles.
    pub fn profiles(&self) -> impl Iterator<Item = &UserProfile> {
        self.entries.iter().map(|(_, profile)| profile)
    }

    /// First account with the seller role.
    #[must_use]
    pub fn first_seller(&self) -> Option<&UserProfile> {
        self.profiles().find(|profile| profile.role == Role::Seller)
    }

    /// Identity provider over this table.
    #[must_use]
    pub fn provider(&self) -> StaticIdentityProvider {
        StaticIdentityProvider {
            entries: self
                .entries
                .iter()
                .map(|(digest, profile)| {
                    (
                        *digest,
                        Principal {
                            id: profile.id,
                            role: profile.role,
                        },
                    )
                })
                .collect(),
        }
    }

    /// User directory over this table.
    #[must_use]
    pub fn directory(&self) -> InMemoryUserDirectory {
        InMemoryUserDirectory::new(self.profiles().cloned())
    }
}

/// Identity provider over a fixed set of token digests.
#[derive(Clone, Debug, Default)]
pub struct StaticIdentityProvider {
    entries: Vec<([u8; 32], Principal)>,
}

impl StaticIdentityProvider {
    fn lookup(&self, token: &str) -> Result<Principal, IdentityError> {
        let digest = token_digest(token);
        // No early exit: every entry is compared.
        let mut found = None;
        for (candidate, principal) in &self.entries {
            if constant_time_eq::constant_time_eq_32(candidate, &digest) {
                found = Some(*principal);
            }
        }
        found.ok_or(IdentityError::InvalidCredentials)
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Principal, IdentityError>> + Send + 'a>> {
        let result = self.lookup(token);
        if let Ok(principal) = &result {
            debug!(user = %principal.id, role = %principal.role, "Credential verified");
        }
        Box::pin(async move { result })
    }
}
