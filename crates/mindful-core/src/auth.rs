use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Where the session stands in the auth lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Bootstrap has not finished yet.
    #[default]
    Loading,
    /// Logged in with an access token and a loaded profile.
    Authenticated,
    /// Using an anonymous identity.
    Anonymous,
    /// First run: the user has not chosen between signing in and continuing
    /// anonymously.
    Welcome,
}

impl AuthStatus {
    /// Whether bootstrap has settled.
    pub fn is_settled(&self) -> bool {
        !matches!(self, AuthStatus::Loading)
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStatus::Loading => write!(f, "loading"),
            AuthStatus::Authenticated => write!(f, "authenticated"),
            AuthStatus::Anonymous => write!(f, "anonymous"),
            AuthStatus::Welcome => write!(f, "welcome"),
        }
    }
}

/// Account details returned by `GET /user/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

// The API has returned both numeric and UUID ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

/// Point-in-time view of the auth session for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    pub profile: Option<UserProfile>,
    pub anon_id: Option<String>,
}

impl SessionSnapshot {
    /// Name to greet the user with.
    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&AuthStatus::Authenticated).unwrap();
        assert_eq!(json, "\"authenticated\"");
        assert_eq!(AuthStatus::Welcome.to_string(), "welcome");
        assert!(!AuthStatus::Loading.is_settled());
        assert!(AuthStatus::Anonymous.is_settled());
    }

    #[test]
    fn profile_accepts_numeric_user_id() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "user_id": 42,
            "username": "testuser",
            "email": "test@example.com",
            "created_at": "2024-05-01T10:00:00Z",
            "timezone": "UTC"
        }))
        .unwrap();
        assert_eq!(profile.user_id, "42");
        assert_eq!(profile.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn profile_optional_fields_default() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "user_id": "b7f0",
            "username": "testuser",
            "email": "test@example.com"
        }))
        .unwrap();
        assert_eq!(profile.user_id, "b7f0");
        assert_eq!(profile.created_at, None);
        assert_eq!(profile.timezone, None);
    }

    #[test]
    fn snapshot_display_name() {
        let mut snap = SessionSnapshot::default();
        assert_eq!(snap.display_name(), None);
        snap.profile = Some(UserProfile {
            user_id: "1".into(),
            username: "testuser".into(),
            email: "t@e.io".into(),
            created_at: None,
            timezone: None,
        });
        assert_eq!(snap.display_name(), Some("testuser"));
    }
}
