//! Domain models for storefront.

pub mod session;

pub use session::{ApiSession, CurrentUser, keys as session_keys};
