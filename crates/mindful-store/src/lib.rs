//! Client-side persistent state for Mindful Web.
//!
//! Everything the client remembers between runs lives in a flat string
//! key/value [`Storage`] backend: the four credential values managed by
//! [`TokenStore`] and the app preferences managed by [`Settings`].

pub mod error;
pub mod keys;
pub mod settings;
pub mod storage;
pub mod tokens;

pub use error::StoreError;
pub use settings::{CachedProfile, NotificationPrefs, Settings, Theme};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use tokens::{TokenProvider, TokenSet, TokenStore, fingerprint};
