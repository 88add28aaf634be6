//! Session-related types.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use vaporwise_core::{Email, UserId};

/// The upstream API session cookie (`name=value` pairs).
///
/// Forwarded as the `Cookie` header on per-user API calls. Redacted in
/// `Debug` output.
#[derive(Clone)]
pub struct ApiSession(SecretString);

impl ApiSession {
    #[must_use]
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(SecretString::from(cookie.into()))
    }

    /// The raw cookie header value.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSession([REDACTED])")
    }
}

// The session store must persist the cookie, so it serializes in the clear.
impl Serialize for ApiSession {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose_secret())
    }
}

impl<'de> Deserialize<'de> for ApiSession {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's id in the remote API.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Name shown in the header, if the user set one.
    pub display_name: Option<String>,
    /// Upstream session to forward on per-user calls.
    pub api_session: ApiSession,
}

impl CurrentUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.local_part())
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
