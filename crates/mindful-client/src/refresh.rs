//! Credential refresh.
//!
//! A [`RefreshManager`] walks its strategies in registration order and hands
//! the refresh to the first one that applies to the stored credentials. The
//! access-token strategy is registered ahead of the anonymous one so a
//! logged-in session is preferred when both kinds of token are present.

use std::fmt;

use mindful_store::{TokenProvider, TokenStore, fingerprint};
use reqwest::Request;

use crate::error::ClientError;
use crate::http::set_bearer;
use crate::services::AuthApi;

/// Which kind of credential gets renewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Exchange the refresh token at `POST /auth/refresh`.
    Access,
    /// Mint a fresh anonymous token at `POST /auth/anonymous`.
    Anonymous,
}

impl RefreshStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RefreshStrategy::Access => "access",
            RefreshStrategy::Anonymous => "anonymous",
        }
    }

    pub fn can_handle(&self, tokens: &TokenProvider) -> bool {
        match self {
            RefreshStrategy::Access => tokens.has_access_token(),
            RefreshStrategy::Anonymous => tokens.has_anon_token(),
        }
    }

    /// Renew the credential, persist it, and return the new bearer token.
    async fn refresh(&self, auth: &AuthApi, store: &TokenStore) -> Result<String, ClientError> {
        match self {
            RefreshStrategy::Access => {
                let refresh_token = store.refresh_token();
                let pair = auth.refresh(refresh_token.as_deref()).await?;
                store.set_access_token(&pair.access_token);
                store.set_refresh_token(&pair.refresh_token);
                Ok(pair.access_token)
            }
            RefreshStrategy::Anonymous => {
                let identity = auth.create_anonymous().await?;
                store.set_anon_token(&identity.anon_token);
                store.set_anon_id(&identity.anon_id);
                Ok(identity.anon_token)
            }
        }
    }
}

impl fmt::Display for RefreshStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refreshed {
    pub strategy: RefreshStrategy,
    pub bearer: String,
}

pub struct RefreshManager {
    auth: AuthApi,
    store: TokenStore,
    tokens: TokenProvider,
    strategies: Vec<RefreshStrategy>,
}

impl RefreshManager {
    /// Manager with the standard order: access, then anonymous.
    ///
    /// `auth` must be backed by a client without a refresher attached, or a
    /// failing refresh call would recurse.
    pub fn new(auth: AuthApi, store: TokenStore) -> Self {
        Self::with_strategies(
            auth,
            store,
            vec![RefreshStrategy::Access, RefreshStrategy::Anonymous],
        )
    }

    pub fn with_strategies(
        auth: AuthApi,
        store: TokenStore,
        strategies: Vec<RefreshStrategy>,
    ) -> Self {
        let tokens = TokenProvider::new(store.clone());
        Self {
            auth,
            store,
            tokens,
            strategies,
        }
    }

    pub fn strategies(&self) -> &[RefreshStrategy] {
        &self.strategies
    }

    /// First registered strategy that applies to the stored credentials.
    pub fn select(&self) -> Option<RefreshStrategy> {
        self.strategies.iter().copied().find(|strategy| {
            let applies = strategy.can_handle(&self.tokens);
            tracing::debug!(strategy = strategy.name(), applies, "Checking refresh strategy");
            applies
        })
    }

    pub async fn refresh(&self) -> Result<Refreshed, ClientError> {
        let Some(strategy) = self.select() else {
            tracing::warn!("No refresh strategy applies to the stored credentials");
            return Err(ClientError::NoRefreshStrategy);
        };

        let bearer = strategy.refresh(&self.auth, &self.store).await.inspect_err(|e| {
            tracing::warn!(strategy = strategy.name(), error = %e, "Credential refresh failed");
        })?;

        tracing::info!(
            strategy = strategy.name(),
            token = %fingerprint(&bearer),
            "Credentials refreshed"
        );
        Ok(Refreshed { strategy, bearer })
    }

    /// Refresh and point `request` at the new credential.
    pub async fn authorize(&self, request: &mut Request) -> Result<RefreshStrategy, ClientError> {
        let refreshed = self.refresh().await?;
        set_bearer(request, &refreshed.bearer)?;
        Ok(refreshed.strategy)
    }
}
