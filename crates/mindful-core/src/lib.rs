pub mod auth;
pub mod error;
pub mod range;
pub mod usage;
pub mod validation;

pub use auth::{AuthStatus, SessionSnapshot, UserProfile};
pub use error::{Field, FieldError, ValidationErrors};
pub use range::{DateRange, RangePreset};
pub use usage::{DomainShare, DomainUsage, Pagination, UsagePage, UsageSummary, format_duration};
