//! HTTP client for the Mindful Web API.
//!
//! Every request gets `Authorization: Bearer <token>` from the
//! [`TokenProvider`]. When a response comes back 401 and a
//! [`RefreshManager`] is attached, the client refreshes credentials once and
//! replays the original request with the new header. A replayed request is
//! never retried again, and when the refresh itself fails the original 401
//! is what the caller sees.

use std::sync::Arc;

use mindful_store::{TokenProvider, fingerprint};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::refresh::RefreshManager;

/// Set `Authorization: Bearer <token>` on `request`, replacing any previous value.
pub(crate) fn set_bearer(request: &mut Request, token: &str) -> Result<(), ClientError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

/// Turn a non-2xx response into [`ClientError::Api`].
///
/// The message comes from the JSON body's `message`, `detail` or `error`
/// string when present, else from the status reason.
pub(crate) async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let details: Option<serde_json::Value> = serde_json::from_str(&body).ok();

    let message = details
        .as_ref()
        .and_then(|json| {
            ["message", "detail", "error"]
                .iter()
                .find_map(|key| json.get(key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
        });

    ClientError::Api {
        message,
        status: Some(status.as_u16()),
        details,
    }
}

/// Decode a successful JSON body.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenProvider,
    refresher: Option<Arc<RefreshManager>>,
    dev_mode: bool,
}

impl ApiClient {
    /// A client without automatic refresh. Attach one with [`with_refresher`].
    ///
    /// [`with_refresher`]: ApiClient::with_refresher
    pub fn new(http: reqwest::Client, base_url: &str, tokens: TokenProvider, dev_mode: bool) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            refresher: None,
            dev_mode,
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<RefreshManager>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Send with bearer injection and the one-shot refresh on 401.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        self.execute(builder, true).await
    }

    /// Send with bearer injection only. Used for the credential endpoints so
    /// a rejected login is reported as-is instead of triggering a refresh.
    pub async fn send_once(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        self.execute(builder, false).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.send(self.request(Method::GET, path).query(query)).await?;
        decode(response).await
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::PATCH, path).json(body)).await?;
        decode(response).await
    }

    async fn execute(&self, builder: RequestBuilder, allow_refresh: bool) -> Result<Response, ClientError> {
        let mut request = builder.build()?;
        if let Some(token) = self.tokens.auth_token() {
            set_bearer(&mut request, &token)?;
            if self.dev_mode {
                tracing::debug!(token = %fingerprint(&token), "Attached bearer token");
            }
        }

        // Cloned up front: the first attempt consumes the request.
        let replay = match (&self.refresher, allow_refresh) {
            (Some(refresher), true) => request.try_clone().map(|r| (r, refresher.clone())),
            _ => None,
        };

        let method = request.method().clone();
        let url = request.url().clone();
        self.log_request(&request);

        let response = self.http.execute(request).await.inspect_err(|e| {
            if self.dev_mode {
                tracing::warn!(method = %method, url = %url, error = %e, "Request failed");
            }
        })?;

        let status = response.status();
        self.log_response(&method, &url, status);
        if status.is_success() {
            return Ok(response);
        }

        let error = error_from_response(response).await;
        if self.dev_mode {
            tracing::warn!(method = %method, url = %url, status = status.as_u16(), error = %error, "API error");
        }

        if status != StatusCode::UNAUTHORIZED {
            return Err(error);
        }
        let Some((mut replay, refresher)) = replay else {
            return Err(error);
        };

        // Boxed: the refresh call reaches `execute` again through `AuthApi`.
        match Box::pin(refresher.authorize(&mut replay)).await {
            Ok(strategy) => {
                tracing::debug!(
                    method = %method,
                    url = %url,
                    strategy = strategy.name(),
                    "Replaying request after token refresh"
                );
                let response = self.http.execute(replay).await?;
                let status = response.status();
                self.log_response(&method, &url, status);
                if status.is_success() {
                    Ok(response)
                } else {
                    Err(error_from_response(response).await)
                }
            }
            Err(refresh_error) => {
                tracing::warn!(
                    method = %method,
                    url = %url,
                    error = %refresh_error,
                    "Token refresh failed, returning original error"
                );
                Err(error)
            }
        }
    }

    fn log_request(&self, request: &Request) {
        if self.dev_mode {
            tracing::debug!(
                method = %request.method(),
                url = %request.url().path(),
                params = request.url().query().unwrap_or(""),
                "API request"
            );
        }
    }

    fn log_response(&self, method: &Method, url: &reqwest::Url, status: StatusCode) {
        if self.dev_mode {
            tracing::debug!(
                method = %method,
                url = %url.path(),
                status = status.as_u16(),
                "API response"
            );
        }
    }
}
