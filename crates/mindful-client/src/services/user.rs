use mindful_core::UserProfile;
use serde::Serialize;

use crate::error::ClientError;
use crate::http::ApiClient;

#[derive(Serialize)]
struct UsernameBody<'a> {
    username: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

/// `/user/profile` endpoints.
#[derive(Clone)]
pub struct UserApi {
    api: ApiClient,
}

impl UserApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.api.get_json("/user/profile", &[]).await
    }

    pub async fn update_username(&self, username: &str) -> Result<UserProfile, ClientError> {
        self.api
            .patch_json("/user/profile/username", &UsernameBody { username })
            .await
    }

    pub async fn update_email(&self, email: &str) -> Result<UserProfile, ClientError> {
        self.api
            .patch_json("/user/profile/email", &EmailBody { email })
            .await
    }
}
