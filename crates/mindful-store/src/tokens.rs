//! Credential storage for the Mindful Web client.
//!
//! Four values are tracked: the access/refresh pair issued on login and the
//! anonymous token/id pair issued to guests. [`TokenStore`] reads and writes
//! them; [`TokenProvider`] answers "which bearer token goes on the next
//! request".
//!
//! Storage failures never propagate out of this module. A failed read is
//! treated as an absent value and a failed write is logged, matching how a
//! full or unavailable browser storage behaves for a web client.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::keys;
use crate::storage::Storage;

/// The full credential state at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub anon_token: Option<String>,
    pub anon_id: Option<String>,
}

/// Short SHA-256 digest of a token, safe to log or display.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

/// Read/write access to the stored credentials.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(keys::ACCESS_TOKEN)
    }

    pub fn set_access_token(&self, token: &str) {
        self.write(keys::ACCESS_TOKEN, token);
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(keys::REFRESH_TOKEN)
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.write(keys::REFRESH_TOKEN, token);
    }

    pub fn anon_token(&self) -> Option<String> {
        self.read(keys::ANON_TOKEN)
    }

    pub fn set_anon_token(&self, token: &str) {
        self.write(keys::ANON_TOKEN, token);
    }

    pub fn anon_id(&self) -> Option<String> {
        self.read(keys::ANON_ID)
    }

    pub fn set_anon_id(&self, id: &str) {
        self.write(keys::ANON_ID, id);
    }

    /// Remove the access and refresh tokens.
    pub fn clear_auth_tokens(&self) {
        self.delete(keys::ACCESS_TOKEN);
        self.delete(keys::REFRESH_TOKEN);
        tracing::debug!("Auth tokens cleared");
    }

    /// Remove the anonymous token and id.
    pub fn clear_anon_tokens(&self) {
        self.delete(keys::ANON_TOKEN);
        self.delete(keys::ANON_ID);
        tracing::debug!("Anonymous tokens cleared");
    }

    pub fn snapshot(&self) -> TokenSet {
        TokenSet {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
            anon_token: self.anon_token(),
            anon_id: self.anon_id(),
        }
    }

    /// Overwrite all four values with `tokens`; `None` fields are removed.
    pub fn restore(&self, tokens: &TokenSet) {
        let fields = [
            (keys::ACCESS_TOKEN, &tokens.access_token),
            (keys::REFRESH_TOKEN, &tokens.refresh_token),
            (keys::ANON_TOKEN, &tokens.anon_token),
            (keys::ANON_ID, &tokens.anon_id),
        ];
        for (key, value) in fields {
            match value {
                Some(v) => self.write(key, v),
                None => self.delete(key),
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    key,
                    backend = self.storage.backend_name(),
                    error = %e,
                    "Token read failed, treating as absent"
                );
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!(
                key,
                backend = self.storage.backend_name(),
                error = %e,
                "Token write failed"
            );
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(
                key,
                backend = self.storage.backend_name(),
                error = %e,
                "Token removal failed"
            );
        }
    }
}

/// Resolves the bearer token for outgoing requests.
///
/// An access token always wins over an anonymous token. Empty strings count
/// as absent.
#[derive(Clone)]
pub struct TokenProvider {
    store: TokenStore,
}

impl TokenProvider {
    pub fn new(store: TokenStore) -> Self {
        Self { store }
    }

    pub fn auth_token(&self) -> Option<String> {
        non_empty(self.store.access_token()).or_else(|| non_empty(self.store.anon_token()))
    }

    pub fn has_access_token(&self) -> bool {
        non_empty(self.store.access_token()).is_some()
    }

    pub fn has_anon_token(&self) -> bool {
        non_empty(self.store.anon_token()).is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
