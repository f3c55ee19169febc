//! Error kinds of a sync run
//!
//! Every error is fatal to the run: nothing is retried and the cursor is never
//! committed once one of these surfaces. The next scheduled run starts again
//! from the unchanged watermark.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::watermark::WatermarkError;

/// Top-level failure of a sync run
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("cursor store failure: {0}")]
    Cursor(#[from] CursorError),

    #[error("run cancelled before completion")]
    Cancelled,
}

/// Missing or unusable process configuration, raised before a run starts
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("required setting '{0}' is missing")]
    MissingField(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigurationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure to establish an authenticated portal session
#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("login form did not become interactive within {timeout_secs}s")]
    LoginFormTimeout { timeout_secs: u64 },

    #[error("login form unavailable: {0}")]
    LoginForm(#[source] BrowserError),

    #[error("failed to submit login form: {0}")]
    Submit(#[source] BrowserError),

    #[error("session cookie '{cookie}' not observed after {attempts} checks")]
    SessionCookieTimeout { cookie: String, attempts: u32 },

    #[error("cookie '{0}' missing from authenticated context")]
    MissingCookie(String),

    #[error("cookie '{cookie}' is not valid percent-encoded UTF-8")]
    MalformedCookie { cookie: String },
}

/// Failure of the browser-automation collaborator
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no element matches selector '{0}'")]
    ElementNotFound(String),

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("element matching '{0}' has no name attribute")]
    UnnamedField(String),

    #[error("no page loaded")]
    NoPage,

    #[error("browser context already closed")]
    Closed,
}

/// Failure while paging through the portal search endpoint
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("request for page {page} of {window} failed: {reason}")]
    Transport {
        window: String,
        page: u32,
        reason: String,
    },

    #[error("page {page} of {window} returned HTTP {status}")]
    Status {
        window: String,
        page: u32,
        status: u16,
    },

    #[error("page {page} of {window} has an unexpected shape: {reason}")]
    Malformed {
        window: String,
        page: u32,
        reason: String,
    },

    #[error("{window} exceeded the limit of {limit} pages")]
    PageLimitExceeded { window: String, limit: u32 },

    #[error("extraction cancelled")]
    Cancelled,
}

/// Failure while posting the batch to the webhook
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("webhook unreachable: {0}")]
    Transport(String),

    #[error("webhook responded with HTTP {status}")]
    Status { status: u16 },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("delivery cancelled")]
    Cancelled,
}

/// Failure reading or writing the persisted watermark
#[derive(Error, Debug)]
pub enum CursorError {
    #[error("failed to read cursor {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cursor {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cursor {} holds an invalid watermark: {source}", path.display())]
    InvalidWatermark {
        path: PathBuf,
        #[source]
        source: WatermarkError,
    },

    #[error("failed to write cursor {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cursor: {0}")]
    Encode(#[from] serde_json::Error),
}
