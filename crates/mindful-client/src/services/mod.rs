//! Thin typed wrappers over the REST endpoints, one per API area.

pub mod analytics;
pub mod auth;
pub mod user;

pub use analytics::AnalyticsApi;
pub use auth::{AnonymousIdentity, AuthApi, TokenPair};
pub use user::UserApi;
