use std::sync::Arc;

use mindful_store::{FileStorage, Settings, Storage, TokenProvider, TokenStore};

use crate::analytics::AnalyticsView;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::refresh::RefreshManager;
use crate::services::{AnalyticsApi, AuthApi, UserApi};
use crate::session::{AuthSession, SessionOptions};

/// Everything the client needs, wired together once at startup.
pub struct AppContext {
    pub config: ClientConfig,
    pub tokens: TokenStore,
    pub settings: Settings,
    pub api: ApiClient,
    pub refresher: Arc<RefreshManager>,
    pub session: AuthSession,
    pub analytics: AnalyticsView,
}

impl AppContext {
    /// Build a context backed by the file storage named in `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let path = config.storage_path();
        let storage = FileStorage::open(path.clone())?;
        tracing::debug!(path = %path.display(), "Using file storage");
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ClientError> {
        let tokens = TokenStore::new(storage.clone());
        let settings = Settings::new(storage);

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {e}")))?;

        // The refresher talks through a client with no refresher of its own.
        let plain = ApiClient::new(
            http,
            &config.api.base_url,
            TokenProvider::new(tokens.clone()),
            config.api.dev_mode,
        );
        let refresher = Arc::new(RefreshManager::new(
            AuthApi::new(plain.clone()),
            tokens.clone(),
        ));
        let api = plain.with_refresher(refresher.clone());

        let session = AuthSession::new(
            AuthApi::new(api.clone()),
            UserApi::new(api.clone()),
            tokens.clone(),
            settings.clone(),
            refresher.clone(),
            SessionOptions {
                clear_anon_on_login: config.auth.clear_anon_on_login,
            },
        );
        let analytics = AnalyticsView::new(AnalyticsApi::new(api.clone()));

        tracing::debug!(
            base_url = %config.api.base_url,
            timeout_secs = config.api.timeout_secs,
            dev_mode = config.api.dev_mode,
            "Client context ready"
        );

        Ok(Self {
            config,
            tokens,
            settings,
            api,
            refresher,
            session,
            analytics,
        })
    }
}
