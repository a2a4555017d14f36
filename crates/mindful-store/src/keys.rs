//! Storage key names. Plain strings, no schema versioning.

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const ANON_TOKEN: &str = "anon_token";
pub const ANON_ID: &str = "anon_id";

pub const THEME: &str = "theme";
pub const LOCALE: &str = "locale";
pub const WELCOME_SHOWN: &str = "welcome_shown";
pub const NOTIFICATIONS: &str = "notifications";
pub const USER_ID: &str = "user_id";

pub const USER_EMAIL: &str = "user_email";
pub const USERNAME: &str = "username";
pub const TIMEZONE: &str = "timezone";
