//! Auth session state machine.
//!
//! ```text
//!            bootstrap
//! Loading ─────────────┬──> Authenticated   (access token + profile loads)
//!                      ├──> Anonymous       (anon token, or silent creation)
//!                      └──> Welcome         (first run, nothing stored)
//! ```
//!
//! Every operation either moves the session to its new state or returns an
//! error and leaves the previous state in place. The only automatic retry is
//! the one-shot 401 refresh inside [`ApiClient`](crate::http::ApiClient).

use std::sync::Arc;

use mindful_core::validation::{
    validate_email, validate_login, validate_registration, validate_username,
    validate_verification,
};
use mindful_core::{AuthStatus, SessionSnapshot, UserProfile, ValidationErrors};
use mindful_store::{Settings, TokenProvider, TokenStore};
use tokio::sync::RwLock;

use crate::error::ClientError;
use crate::refresh::{RefreshManager, Refreshed};
use crate::services::{AuthApi, UserApi};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Drop the anonymous identity after a successful login.
    pub clear_anon_on_login: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            clear_anon_on_login: true,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    status: AuthStatus,
    profile: Option<UserProfile>,
}

pub struct AuthSession {
    auth: AuthApi,
    user: UserApi,
    store: TokenStore,
    tokens: TokenProvider,
    settings: Settings,
    refresher: Arc<RefreshManager>,
    options: SessionOptions,
    state: RwLock<SessionState>,
}

impl AuthSession {
    pub fn new(
        auth: AuthApi,
        user: UserApi,
        store: TokenStore,
        settings: Settings,
        refresher: Arc<RefreshManager>,
        options: SessionOptions,
    ) -> Self {
        let tokens = TokenProvider::new(store.clone());
        Self {
            auth,
            user,
            store,
            tokens,
            settings,
            refresher,
            options,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub async fn status(&self) -> AuthStatus {
        self.state.read().await.status
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.state.read().await.profile.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            status: state.status,
            profile: state.profile.clone(),
            anon_id: self.store.anon_id(),
        }
    }

    /// Decide the initial status from stored credentials.
    ///
    /// Never fails: a stale access token is dropped and the session falls
    /// back to the anonymous/welcome decision.
    pub async fn bootstrap(&self) -> AuthStatus {
        self.set_state(AuthStatus::Loading, None).await;

        if self.tokens.has_access_token() {
            match self.user.profile().await {
                Ok(profile) => {
                    self.cache_profile(&profile);
                    tracing::info!(username = %profile.username, "Session restored");
                    self.set_state(AuthStatus::Authenticated, Some(profile)).await;
                    return AuthStatus::Authenticated;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stored session rejected, dropping auth tokens");
                    self.store.clear_auth_tokens();
                    self.settings.clear_profile_cache();
                }
            }
        }

        self.settle_unauthenticated().await
    }

    /// Anonymous if an anon token exists, else silent anonymous creation
    /// when the welcome screen was already shown, else welcome.
    async fn settle_unauthenticated(&self) -> AuthStatus {
        if self.tokens.has_anon_token() {
            tracing::info!(anon_id = ?self.store.anon_id(), "Continuing anonymous session");
            self.set_state(AuthStatus::Anonymous, None).await;
            return AuthStatus::Anonymous;
        }

        if !self.settings.welcome_shown() {
            tracing::info!("First run, showing welcome screen");
            self.set_state(AuthStatus::Welcome, None).await;
            return AuthStatus::Welcome;
        }

        match self.create_anonymous().await {
            Ok(_) => AuthStatus::Anonymous,
            Err(e) => {
                tracing::error!(error = %e, "Anonymous identity creation failed, showing welcome screen");
                self.set_state(AuthStatus::Welcome, None).await;
                AuthStatus::Welcome
            }
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ClientError> {
        validate_login(username, password)?;

        let previous = self.store.snapshot();
        let pair = self.auth.login(username.trim(), password).await?;
        self.store.set_access_token(&pair.access_token);
        self.store.set_refresh_token(&pair.refresh_token);
        if self.options.clear_anon_on_login {
            self.store.clear_anon_tokens();
        }

        match self.user.profile().await {
            Ok(profile) => {
                self.cache_profile(&profile);
                tracing::info!(username = %profile.username, "Logged in");
                self.set_state(AuthStatus::Authenticated, Some(profile.clone()))
                    .await;
                Ok(profile)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch after login failed, restoring previous credentials");
                self.store.restore(&previous);
                Err(e)
            }
        }
    }

    /// Create an account. The account still needs [`verify`](Self::verify)
    /// before it can log in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        validate_registration(username, email, password)?;
        self.auth.register(username, email, password).await?;
        tracing::info!(username, "Registration submitted, awaiting verification");
        Ok(())
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<(), ClientError> {
        validate_verification(email, code)?;
        self.auth.verify(email, code).await?;
        tracing::info!(email, "Email verified");
        Ok(())
    }

    pub async fn resend_code(&self, email: &str) -> Result<(), ClientError> {
        validate_email(email).map_err(ValidationErrors::from)?;
        self.auth.resend_code(email).await?;
        tracing::info!(email, "Verification code resent");
        Ok(())
    }

    /// Sign out. Local auth tokens are cleared even when the server call
    /// fails, then the session re-enters the anonymous/welcome decision.
    pub async fn logout(&self) -> AuthStatus {
        if let Err(e) = self.auth.logout().await {
            tracing::warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.store.clear_auth_tokens();
        self.settings.clear_profile_cache();
        self.set_state(AuthStatus::Loading, None).await;
        tracing::info!("Logged out");

        self.settle_unauthenticated().await
    }

    /// Manually run the same refresh the HTTP client performs on a 401.
    pub async fn refresh(&self) -> Result<Refreshed, ClientError> {
        self.refresher.refresh().await
    }

    /// Mint an anonymous identity and switch to it.
    ///
    /// A signed-in account is dropped locally so the stored access token can
    /// never outrank the new anonymous one.
    pub async fn create_anonymous(&self) -> Result<String, ClientError> {
        let identity = self.auth.create_anonymous().await?;
        if self.tokens.has_access_token() {
            tracing::info!("Leaving signed-in session for anonymous identity");
            self.store.clear_auth_tokens();
            self.settings.clear_profile_cache();
        }
        self.store.set_anon_token(&identity.anon_token);
        self.store.set_anon_id(&identity.anon_id);
        self.mark_welcome_shown();
        tracing::info!(anon_id = %identity.anon_id, "Anonymous identity created");
        self.set_state(AuthStatus::Anonymous, None).await;
        Ok(identity.anon_id)
    }

    /// Leave the welcome screen without a network call.
    ///
    /// The status is derived from stored credentials. With nothing stored the
    /// session stays on `Welcome`, but the flag is persisted so the next
    /// bootstrap creates an anonymous identity silently.
    pub async fn dismiss_welcome(&self) -> AuthStatus {
        self.mark_welcome_shown();

        let mut state = self.state.write().await;
        state.status = if self.tokens.has_access_token() && state.profile.is_some() {
            AuthStatus::Authenticated
        } else if self.tokens.has_anon_token() {
            AuthStatus::Anonymous
        } else {
            AuthStatus::Welcome
        };
        state.status
    }

    pub async fn show_welcome_screen(&self) -> AuthStatus {
        self.state.write().await.status = AuthStatus::Welcome;
        AuthStatus::Welcome
    }

    pub async fn reload_profile(&self) -> Result<UserProfile, ClientError> {
        self.require_access_token()?;
        let profile = self.user.profile().await?;
        self.replace_profile(&profile).await;
        Ok(profile)
    }

    pub async fn update_username(&self, username: &str) -> Result<UserProfile, ClientError> {
        validate_username(username).map_err(ValidationErrors::from)?;
        self.require_access_token()?;
        let profile = self.user.update_username(username).await?;
        self.replace_profile(&profile).await;
        tracing::info!(username = %profile.username, "Username updated");
        Ok(profile)
    }

    pub async fn update_email(&self, email: &str) -> Result<UserProfile, ClientError> {
        validate_email(email).map_err(ValidationErrors::from)?;
        self.require_access_token()?;
        let profile = self.user.update_email(email).await?;
        self.replace_profile(&profile).await;
        tracing::info!(email = %profile.email, "Email updated");
        Ok(profile)
    }

    fn require_access_token(&self) -> Result<(), ClientError> {
        if self.tokens.has_access_token() {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }

    async fn replace_profile(&self, profile: &UserProfile) {
        self.cache_profile(profile);
        self.state.write().await.profile = Some(profile.clone());
    }

    fn cache_profile(&self, profile: &UserProfile) {
        self.settings
            .cache_profile(&profile.email, &profile.username, profile.timezone.as_deref());
    }

    fn mark_welcome_shown(&self) {
        if let Err(e) = self.settings.set_welcome_shown(true) {
            tracing::warn!(error = %e, "Could not persist welcome flag");
        }
    }

    async fn set_state(&self, status: AuthStatus, profile: Option<UserProfile>) {
        let mut state = self.state.write().await;
        if state.status != status {
            tracing::debug!(from = %state.status, to = %status, "Auth status changed");
        }
        state.status = status;
        state.profile = profile;
    }
}
