//! Client SDK for the Mindful Web API.
//!
//! [`AppContext`] wires the pieces together:
//!
//! - [`ApiClient`] injects the bearer token and retries once on 401,
//! - [`RefreshManager`] renews the access or anonymous credential,
//! - [`AuthSession`] runs the loading/authenticated/anonymous/welcome
//!   state machine,
//! - [`AnalyticsView`] fetches usage windows for the dashboard.
//!
//! ```rust,no_run
//! use mindful_client::{AppContext, ClientConfig};
//!
//! # async fn run() -> Result<(), mindful_client::ClientError> {
//! let ctx = AppContext::from_config(ClientConfig::load(None)?)?;
//! let status = ctx.session.bootstrap().await;
//! println!("{status}");
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod refresh;
pub mod services;
pub mod session;

pub use analytics::{AnalyticsView, UsageReport};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ClientError, ErrorReport};
pub use http::ApiClient;
pub use refresh::{RefreshManager, RefreshStrategy, Refreshed};
pub use session::{AuthSession, SessionOptions};
