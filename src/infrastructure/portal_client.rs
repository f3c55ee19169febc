//! Lead portal search client
//!
//! Issues `POST /leadList?page={n}` with the session tokens and validates the
//! response shape at the boundary before anything downstream sees it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::domain::auth_session::AuthSession;
use crate::domain::date_window::DateWindow;
use crate::domain::errors::ExtractionError;
use crate::domain::lead::{LeadPage, RawLeadRecord};
use crate::domain::services::LeadPortal;
use crate::infrastructure::http_client::{HttpClient, HttpError};

const XSRF_HEADER: &str = "x-xsrf-token";

/// Settings for the search endpoint
#[derive(Debug, Clone)]
pub struct PortalSettings {
    pub search_url: Url,
    pub project_id: u32,
    pub search_by: String,
    pub session_cookie: String,
    pub xsrf_cookie: String,
}

/// Request body of the search endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadListRequest<'a> {
    search_by: &'a str,
    date_filter: String,
    project: u32,
}

/// Response body of the search endpoint
#[derive(Debug, Deserialize)]
struct LeadListResponse {
    #[serde(default)]
    data: LeadCollection,
    #[serde(default)]
    next_page_url: Option<String>,
}

/// `data` is normally an object keyed by lead id, but an empty result set
/// comes back as `[]` or `null`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LeadCollection {
    Keyed(BTreeMap<String, RawLeadRecord>),
    Listed(Vec<RawLeadRecord>),
    Empty(()),
}

impl Default for LeadCollection {
    fn default() -> Self {
        Self::Empty(())
    }
}

impl LeadCollection {
    fn into_records(self) -> Vec<RawLeadRecord> {
        match self {
            Self::Keyed(records) => records.into_values().collect(),
            Self::Listed(records) => records,
            Self::Empty(()) => Vec::new(),
        }
    }
}

/// Parse one page body; `Err` carries the reason the shape was rejected
pub fn parse_lead_page(body: &[u8]) -> Result<LeadPage, String> {
    let response: LeadListResponse = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    Ok(LeadPage {
        records: response.data.into_records(),
        next_page_url: response.next_page_url,
    })
}

/// [`LeadPortal`] over the shared [`HttpClient`]
pub struct PortalClient {
    http: Arc<HttpClient>,
    settings: PortalSettings,
}

impl PortalClient {
    pub const fn new(http: Arc<HttpClient>, settings: PortalSettings) -> Self {
        Self { http, settings }
    }

    fn page_url(&self, page: u32) -> Url {
        let mut url = self.settings.search_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string());
        url
    }

    fn session_headers(&self, session: &AuthSession) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(XSRF_HEADER),
            HeaderValue::from_str(&session.xsrf_token).map_err(|e| e.to_string())?,
        );
        let cookie = format!(
            "{}={}; {}={}",
            self.settings.xsrf_cookie,
            session.xsrf_token,
            self.settings.session_cookie,
            session.session_token
        );
        let mut cookie = HeaderValue::from_str(&cookie).map_err(|e| e.to_string())?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
        Ok(headers)
    }
}

#[async_trait]
impl LeadPortal for PortalClient {
    async fn fetch_page(
        &self,
        window: &DateWindow,
        page: u32,
        session: &AuthSession,
    ) -> Result<LeadPage, ExtractionError> {
        let label = window.filter_label();
        let headers = self
            .session_headers(session)
            .map_err(|reason| ExtractionError::Transport {
                window: label.clone(),
                page,
                reason: format!("session tokens are not valid header values: {reason}"),
            })?;
        let request = LeadListRequest {
            search_by: &self.settings.search_by,
            date_filter: label.clone(),
            project: self.settings.project_id,
        };

        let body = self
            .http
            .post_json(&self.page_url(page), headers, &request)
            .await
            .map_err(|error| match error {
                HttpError::Cancelled => ExtractionError::Cancelled,
                HttpError::Status { status, .. } => ExtractionError::Status {
                    window: label.clone(),
                    page,
                    status,
                },
                other => ExtractionError::Transport {
                    window: label.clone(),
                    page,
                    reason: other.to_string(),
                },
            })?;

        let parsed = parse_lead_page(&body).map_err(|reason| ExtractionError::Malformed {
            window: label.clone(),
            page,
            reason,
        })?;

        tracing::debug!(
            window = %label,
            page,
            records = parsed.records.len(),
            has_next = parsed.has_next_page(),
            "Fetched lead page"
        );
        Ok(parsed)
    }
}
