//! Portal credentials and the per-run authenticated session

use std::fmt;

/// Login credentials for the portal
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Tokens extracted once after login and presented on every page request.
/// Lives for a single run and is never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Anti-forgery token, already percent-decoded
    pub xsrf_token: String,
    /// Raw session cookie value
    pub session_token: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("xsrf_token", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// A cookie as read back from the browser context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
