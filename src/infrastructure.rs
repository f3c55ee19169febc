//! Infrastructure layer for configuration, logging, and external integrations
//!
//! This module provides the HTTP transport, the portal and webhook clients, the
//! form browser used for login, and the file-backed cursor store.

pub mod config; // Configuration loading and defaults
pub mod cursor_store;
pub mod form_browser;
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod portal_client;
pub mod webhook_client;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use cursor_store::JsonCursorStore;
pub use form_browser::HttpFormBrowser;
pub use http_client::{HttpClient, HttpClientConfig, HttpError};
pub use logging::{get_log_directory, init_logging_with_config};
pub use portal_client::{PortalClient, PortalSettings, parse_lead_page};
pub use webhook_client::WebhookClient;
