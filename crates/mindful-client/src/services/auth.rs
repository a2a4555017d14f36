use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::http::{ApiClient, decode};

/// `{access_token, refresh_token}` from login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// `{anon_id, anon_token}` from `POST /auth/anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnonymousIdentity {
    pub anon_id: String,
    pub anon_token: String,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    email: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: Option<&'a str>,
}

/// `/auth/*` endpoints. None of these go through the 401 refresh path.
#[derive(Clone)]
pub struct AuthApi {
    api: ApiClient,
}

impl AuthApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ClientError> {
        let request = self
            .api
            .request(Method::POST, "/auth/login")
            .json(&LoginBody { username, password });
        decode(self.api.send_once(request).await?).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let request = self.api.request(Method::POST, "/auth/register").json(&RegisterBody {
            username,
            email,
            password,
        });
        self.api.send_once(request).await?;
        Ok(())
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<(), ClientError> {
        let request = self
            .api
            .request(Method::POST, "/auth/verify")
            .json(&VerifyBody { email, code });
        self.api.send_once(request).await?;
        Ok(())
    }

    pub async fn resend_code(&self, email: &str) -> Result<(), ClientError> {
        let request = self
            .api
            .request(Method::POST, "/auth/resend-code")
            .json(&EmailBody { email });
        self.api.send_once(request).await?;
        Ok(())
    }

    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenPair, ClientError> {
        let request = self
            .api
            .request(Method::POST, "/auth/refresh")
            .json(&RefreshBody { refresh_token });
        decode(self.api.send_once(request).await?).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let request = self.api.request(Method::POST, "/auth/logout");
        self.api.send_once(request).await?;
        Ok(())
    }

    pub async fn create_anonymous(&self) -> Result<AnonymousIdentity, ClientError> {
        let request = self.api.request(Method::POST, "/auth/anonymous");
        decode(self.api.send_once(request).await?).await
    }
}
