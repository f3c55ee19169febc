//! Configuration infrastructure
//!
//! Contains configuration loading for the lead sync job.
//!
//! Configuration is layered, later sources winning:
//! 1. Built-in defaults (see [`defaults`])
//! 2. Optional JSON config file
//! 3. `LEAD_SYNC_*` environment variables (`__` separates nested keys)
//! 4. The portal/webhook variables the job has always read
//!    (`PORTAL_EMAIL`, `PORTAL_PASSWORD`, `VIASOCKET_WEBHOOK`)

#![allow(clippy::derivable_impls)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};

use crate::domain::errors::ConfigurationError;

/// Complete application configuration as loaded, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Lead portal access and search settings
    pub portal: PortalConfig,

    /// Downstream webhook
    pub webhook: WebhookConfig,

    /// Cursor and window settings
    pub sync: SyncConfig,

    /// Login timing
    pub auth: AuthTimingConfig,

    /// Outbound HTTP behaviour
    pub http: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Portal access and search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Portal root; the login form is served here
    pub base_url: String,

    /// Search endpoint path relative to `base_url`
    pub search_path: String,

    /// Login email (required)
    pub email: Option<String>,

    /// Login password (required)
    pub password: Option<String>,

    /// Project whose leads are synced (required)
    pub project_id: Option<u32>,

    /// `searchBy` value sent with every query
    pub search_by: String,

    /// Cookie that appears once login succeeded
    pub session_cookie: String,

    /// Anti-forgery cookie echoed back as a header
    pub xsrf_cookie: String,

    /// Safety cap on pages fetched per window
    pub max_pages_per_window: u32,

    /// Login form selectors
    pub login: LoginFormConfig,
}

/// CSS selectors used to drive the login form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginFormConfig {
    pub ready_selector: String,
    pub email_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
}

/// Downstream webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook URL (required)
    pub url: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Cursor and window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of calendar months queried per run
    pub month_count: u32,

    /// Scheduler cadence, only used in the incremental mode label
    pub schedule_interval_hours: u32,

    /// Location of the persisted cursor document
    pub cursor_path: PathBuf,

    /// `meta.source` tag; derived from the project id when unset
    pub source_tag: Option<String>,
}

/// Login timing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthTimingConfig {
    /// Bound on loading the login form
    pub navigation_timeout_seconds: u64,

    /// Interval between session cookie checks
    pub cookie_poll_interval_ms: u64,

    /// Bound on waiting for the session cookie
    pub cookie_poll_timeout_seconds: u64,

    /// Pause between filling the form and submitting it
    pub form_settle_ms: u64,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Request budget of each outbound client
    pub max_requests_per_second: u32,

    pub follow_redirects: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            portal: PortalConfig::default(),
            webhook: WebhookConfig::default(),
            sync: SyncConfig::default(),
            auth: AuthTimingConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::PORTAL_BASE_URL.to_string(),
            search_path: defaults::SEARCH_PATH.to_string(),
            email: None,
            password: None,
            project_id: None,
            search_by: defaults::SEARCH_BY.to_string(),
            session_cookie: defaults::SESSION_COOKIE.to_string(),
            xsrf_cookie: defaults::XSRF_COOKIE.to_string(),
            max_pages_per_window: defaults::MAX_PAGES_PER_WINDOW,
            login: LoginFormConfig::default(),
        }
    }
}

impl Default for LoginFormConfig {
    fn default() -> Self {
        Self {
            ready_selector: defaults::LOGIN_READY_SELECTOR.to_string(),
            email_selector: defaults::LOGIN_EMAIL_SELECTOR.to_string(),
            password_selector: defaults::LOGIN_PASSWORD_SELECTOR.to_string(),
            submit_selector: defaults::LOGIN_SUBMIT_SELECTOR.to_string(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            month_count: defaults::MONTH_COUNT,
            schedule_interval_hours: defaults::SCHEDULE_INTERVAL_HOURS,
            cursor_path: PathBuf::from(defaults::CURSOR_FILE),
            source_tag: None,
        }
    }
}

impl Default for AuthTimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_seconds: defaults::NAVIGATION_TIMEOUT_SECONDS,
            cookie_poll_interval_ms: defaults::COOKIE_POLL_INTERVAL_MS,
            cookie_poll_timeout_seconds: defaults::COOKIE_POLL_TIMEOUT_SECONDS,
            form_settle_ms: defaults::FORM_SETTLE_MS,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("h2".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Environment variable names of earlier deployments, mapped to config keys
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("PORTAL_EMAIL", "portal.email"),
    ("PORTAL_PASSWORD", "portal.password"),
    ("VIASOCKET_WEBHOOK", "webhook.url"),
];

/// Configuration manager for locating and loading settings
pub struct ConfigManager {
    pub config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Environment variable that points at an explicit config file
    pub const CONFIG_PATH_ENV: &'static str = "LEAD_SYNC_CONFIG";

    /// Prefix of environment overrides
    pub const ENV_PREFIX: &'static str = "LEAD_SYNC";

    /// Get the application configuration directory
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lead-sync"))
    }

    /// Resolve the config file from `$LEAD_SYNC_CONFIG` or the user config directory
    pub fn new() -> Self {
        let config_path = std::env::var_os(Self::CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| Self::get_config_dir().map(|dir| dir.join(defaults::CONFIG_FILE)));
        Self { config_path }
    }

    /// Use an explicit config file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Ignore config files entirely; defaults and environment only
    pub const fn without_file() -> Self {
        Self { config_path: None }
    }

    /// Load configuration against the process environment
    pub fn load_config(&self) -> Result<AppConfig, ConfigurationError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        self.load_with_env(&env)
    }

    /// Load configuration against an explicit environment map
    pub fn load_with_env(
        &self,
        env: &HashMap<String, String>,
    ) -> Result<AppConfig, ConfigurationError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.config_path {
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(Some(env.clone())),
        );

        for (variable, key) in LEGACY_ENV_KEYS {
            let value = env
                .get(*variable)
                .filter(|value| !value.trim().is_empty())
                .cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub const fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Default sync configuration values
pub mod defaults {
    /// Portal root serving the login form
    pub const PORTAL_BASE_URL: &str = "https://svform.urbanriseprojects.in/";

    /// Search endpoint, relative to the portal root
    pub const SEARCH_PATH: &str = "leadList";

    /// Search mode the portal expects
    pub const SEARCH_BY: &str = "contact";

    /// Cookie set once the login succeeded
    pub const SESSION_COOKIE: &str = "sv_forms_session";

    /// Anti-forgery cookie (percent-encoded in the jar)
    pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

    /// Default number of calendar months per run
    pub const MONTH_COUNT: u32 = 6;

    /// Default scheduler cadence in hours
    pub const SCHEDULE_INTERVAL_HOURS: u32 = 2;

    /// Default cursor document location
    pub const CURSOR_FILE: &str = "cursor.json";

    /// Default config file name inside the config directory
    pub const CONFIG_FILE: &str = "lead_sync_config.json";

    /// Default cap on pages per window
    pub const MAX_PAGES_PER_WINDOW: u32 = 500;

    // Login form defaults
    /// Selector that signals the login form is interactive
    pub const LOGIN_READY_SELECTOR: &str = r#"input[type="password"]"#;

    /// Email input selector
    pub const LOGIN_EMAIL_SELECTOR: &str = r#"input[type="email"], input[name="email"]"#;

    /// Password input selector
    pub const LOGIN_PASSWORD_SELECTOR: &str = r#"input[type="password"]"#;

    /// Submit control selector
    pub const LOGIN_SUBMIT_SELECTOR: &str = "button";

    // Timing defaults
    /// Default login page navigation timeout in seconds
    pub const NAVIGATION_TIMEOUT_SECONDS: u64 = 60;

    /// Default session cookie poll interval in milliseconds
    pub const COOKIE_POLL_INTERVAL_MS: u64 = 500;

    /// Default session cookie poll timeout in seconds
    pub const COOKIE_POLL_TIMEOUT_SECONDS: u64 = 60;

    /// Default pause before submitting the login form in milliseconds
    pub const FORM_SETTLE_MS: u64 = 2000;

    // HTTP defaults
    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default request budget per second
    pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

    /// Default user agent
    pub const USER_AGENT: &str = "lead-sync/0.2 (+scheduled incremental sync)";

    // Log configuration defaults
    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;
}
