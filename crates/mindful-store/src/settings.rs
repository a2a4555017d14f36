use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::keys;
use crate::storage::Storage;

pub const DEFAULT_LOCALE: &str = "en";

/// UI colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::System => write!(f, "system"),
        }
    }
}

impl FromStr for Theme {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(StoreError::InvalidValue {
                key: keys::THEME.into(),
                reason: format!("unknown theme '{other}'"),
            }),
        }
    }
}

/// Which notifications the user has opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    #[serde(default = "default_true")]
    pub weekly_report: bool,
    #[serde(default)]
    pub usage_alerts: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            weekly_report: true,
            usage_alerts: false,
        }
    }
}

/// Profile fields kept locally so they can be shown before the server answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedProfile {
    pub email: Option<String>,
    pub username: Option<String>,
    pub timezone: Option<String>,
}

/// App preferences stored next to the credentials.
#[derive(Clone)]
pub struct Settings {
    storage: Arc<dyn Storage>,
}

impl Settings {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Stored theme, falling back to [`Theme::System`] when unset or unreadable.
    pub fn theme(&self) -> Theme {
        match self.storage.get(keys::THEME) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(value = %raw, error = %e, "Ignoring stored theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Theme read failed");
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.storage.set(keys::THEME, &theme.to_string())
    }

    pub fn locale(&self) -> String {
        self.read_string(keys::LOCALE)
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
    }

    pub fn set_locale(&self, locale: &str) -> Result<(), StoreError> {
        self.storage.set(keys::LOCALE, locale)
    }

    pub fn welcome_shown(&self) -> bool {
        self.read_string(keys::WELCOME_SHOWN).as_deref() == Some("true")
    }

    pub fn set_welcome_shown(&self, shown: bool) -> Result<(), StoreError> {
        self.storage
            .set(keys::WELCOME_SHOWN, if shown { "true" } else { "false" })
    }

    pub fn notifications(&self) -> NotificationPrefs {
        let Some(raw) = self.read_string(keys::NOTIFICATIONS) else {
            return NotificationPrefs::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring malformed notification preferences");
            NotificationPrefs::default()
        })
    }

    pub fn set_notifications(&self, prefs: &NotificationPrefs) -> Result<(), StoreError> {
        let json = serde_json::to_string(prefs)?;
        self.storage.set(keys::NOTIFICATIONS, &json)
    }

    /// Stable per-install identifier, generated on first use.
    pub fn user_id(&self) -> Result<String, StoreError> {
        if let Some(id) = self.storage.get(keys::USER_ID)? {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.storage.set(keys::USER_ID, &id)?;
        tracing::info!(user_id = %id, "Generated install user id");
        Ok(id)
    }

    pub fn cached_profile(&self) -> CachedProfile {
        CachedProfile {
            email: self.read_string(keys::USER_EMAIL),
            username: self.read_string(keys::USERNAME),
            timezone: self.read_string(keys::TIMEZONE),
        }
    }

    /// Remember profile fields. A `None` timezone removes the cached one.
    pub fn cache_profile(&self, email: &str, username: &str, timezone: Option<&str>) {
        let result = self
            .storage
            .set(keys::USER_EMAIL, email)
            .and_then(|()| self.storage.set(keys::USERNAME, username))
            .and_then(|()| match timezone {
                Some(tz) => self.storage.set(keys::TIMEZONE, tz),
                None => self.storage.remove(keys::TIMEZONE),
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "Profile cache write failed");
        }
    }

    pub fn clear_profile_cache(&self) {
        for key in [keys::USER_EMAIL, keys::USERNAME, keys::TIMEZONE] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Profile cache removal failed");
            }
        }
    }

    fn read_string(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Setting read failed");
            None
        })
    }
}
