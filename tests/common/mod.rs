//! Test doubles shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use lead_sync_lib::application::{
    AuthSettings, EngineSettings, SessionAuthenticator, SyncEngine,
};
use lead_sync_lib::domain::services::{BrowserDriver, CursorStore, LeadPortal, WebhookSink};
use lead_sync_lib::domain::{
    AuthSession, BrowserCookie, BrowserError, DateWindow, DeliveryError, DeliveryPayload,
    ExtractionError, LeadPage, NormalizedRecord, RawLeadRecord,
};

/// Browser whose login always succeeds, unless told otherwise
#[derive(Default)]
pub struct FakeBrowser {
    pub fail_login_form: bool,
    pub stall_login_page: bool,
    pub withhold_session_cookie: bool,
    pub closed: Arc<Mutex<u32>>,
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn navigate(&mut self, _url: &str, ready_selector: &str) -> Result<(), BrowserError> {
        if self.stall_login_page {
            std::future::pending::<()>().await;
        }
        if self.fail_login_form {
            return Err(BrowserError::ElementNotFound(ready_selector.to_string()));
        }
        Ok(())
    }

    async fn fill_field(&mut self, _selector: &str, _value: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click(&mut self, _selector: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn read_cookies(&self) -> Result<Vec<BrowserCookie>, BrowserError> {
        let mut cookies = vec![BrowserCookie::new("XSRF-TOKEN", "xsrf%3D")];
        if !self.withhold_session_cookie {
            cookies.push(BrowserCookie::new("sv_forms_session", "session"));
        }
        Ok(cookies)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        *self.closed.lock().unwrap() += 1;
        Ok(())
    }
}

/// One portal request as the fake saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub window: String,
    pub page: u32,
    pub xsrf_token: String,
}

/// Serves scripted pages per window label; unknown windows are empty
#[derive(Default)]
pub struct FakePortal {
    pages: HashMap<String, Vec<Vec<RawLeadRecord>>>,
    pub requests: Mutex<Vec<PageRequest>>,
}

impl FakePortal {
    pub fn with_window(mut self, window: &DateWindow, pages: Vec<Vec<RawLeadRecord>>) -> Self {
        self.pages.insert(window.filter_label(), pages);
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeadPortal for FakePortal {
    async fn fetch_page(
        &self,
        window: &DateWindow,
        page: u32,
        session: &AuthSession,
    ) -> Result<LeadPage, ExtractionError> {
        let label = window.filter_label();
        self.requests.lock().unwrap().push(PageRequest {
            window: label.clone(),
            page,
            xsrf_token: session.xsrf_token.clone(),
        });

        let Some(pages) = self.pages.get(&label) else {
            return Ok(LeadPage::default());
        };
        let index = page as usize - 1;
        let records = pages.get(index).cloned().unwrap_or_default();
        let next_page_url = (index + 1 < pages.len())
            .then(|| format!("https://portal.example.com/leadList?page={}", page + 1));
        Ok(LeadPage {
            records,
            next_page_url,
        })
    }
}

/// Captures delivered payloads, or fails every delivery
#[derive(Default)]
pub struct RecordingSink {
    pub fail_with_status: Option<u16>,
    pub deliveries: Mutex<Vec<serde_json::Value>>,
}

impl RecordingSink {
    pub fn deliveries(&self) -> Vec<serde_json::Value> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookSink for RecordingSink {
    async fn deliver(&self, payload: &DeliveryPayload<'_>) -> Result<(), DeliveryError> {
        if let Some(status) = self.fail_with_status {
            return Err(DeliveryError::Status { status });
        }
        self.deliveries
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload)?);
        Ok(())
    }
}

pub fn lead(created_at: &str, contact: &str) -> RawLeadRecord {
    serde_json::from_value(json!({
        "first_name": format!(" Lead {contact} "),
        "contact": contact,
        "lead_source": "Website",
        "lead_sub_source": null,
        "lead_stage": { "id": 3 },
        "lead_number": 1000,
        "created_at": created_at,
        "updated_at": created_at,
        "recent_date": "",
    }))
    .unwrap()
}

pub fn normalized_created_at(delivery: &serde_json::Value) -> Vec<String> {
    let records: Vec<NormalizedRecord> =
        serde_json::from_value(delivery["records"].clone()).unwrap();
    records.into_iter().map(|r| r.created_at).collect()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
}

pub fn window(year: i32, month: u32) -> DateWindow {
    DateWindow::month_of(NaiveDate::from_ymd_opt(year, month, 1).unwrap()).unwrap()
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        login_url: "https://portal.example.com/".to_string(),
        ready_selector: "input[type=\"password\"]".to_string(),
        email_selector: "input[name=\"email\"]".to_string(),
        password_selector: "input[type=\"password\"]".to_string(),
        submit_selector: "button".to_string(),
        session_cookie: "sv_forms_session".to_string(),
        xsrf_cookie: "XSRF-TOKEN".to_string(),
        navigation_timeout: Duration::from_secs(60),
        poll_interval: Duration::from_millis(500),
        poll_timeout: Duration::from_secs(60),
        form_settle: Duration::from_millis(2000),
    }
}

pub fn engine_settings() -> EngineSettings {
    EngineSettings {
        month_count: 6,
        project_id: 21,
        source_tag: "project_21_portal".to_string(),
        backfill_label: "6_month_backfill".to_string(),
        incremental_label: "2_hour_incremental".to_string(),
        max_pages_per_window: 500,
    }
}

pub fn engine(
    cursor_store: Arc<dyn CursorStore>,
    portal: Arc<FakePortal>,
    sink: Arc<RecordingSink>,
) -> SyncEngine {
    SyncEngine::new(
        cursor_store,
        portal,
        sink,
        SessionAuthenticator::new(auth_settings()),
        engine_settings(),
        CancellationToken::new(),
    )
}
