//! 동기화 파이프라인 협력자 트레이트 정의
//!
//! The sync engine only talks to the outside world through these seams, so the
//! browser engine, HTTP transport and storage can be swapped or faked.

use async_trait::async_trait;

use crate::domain::auth_session::{AuthSession, BrowserCookie};
use crate::domain::date_window::DateWindow;
use crate::domain::errors::{BrowserError, CursorError, DeliveryError, ExtractionError};
use crate::domain::lead::LeadPage;
use crate::domain::sync_batch::DeliveryPayload;
use crate::domain::watermark::Watermark;

/// 워터마크 저장소
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Persisted watermark, or the epoch sentinel when nothing is stored
    async fn load(&self) -> Result<Watermark, CursorError>;

    /// Replace the persisted watermark atomically
    async fn commit(&self, watermark: &Watermark) -> Result<(), CursorError>;
}

/// 브라우저 자동화 기능
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load `url`; the navigation only counts once `ready_selector` matches
    async fn navigate(&mut self, url: &str, ready_selector: &str) -> Result<(), BrowserError>;

    async fn fill_field(&mut self, selector: &str, value: &str) -> Result<(), BrowserError>;

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    async fn read_cookies(&self) -> Result<Vec<BrowserCookie>, BrowserError>;

    /// Tear down the context; must be safe to call more than once
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// 포털 리드 검색 API
#[async_trait]
pub trait LeadPortal: Send + Sync {
    /// Fetch one page (1-based) of leads created inside `window`
    async fn fetch_page(
        &self,
        window: &DateWindow,
        page: u32,
        session: &AuthSession,
    ) -> Result<LeadPage, ExtractionError>;
}

/// 웹훅 전송
#[async_trait]
pub trait WebhookSink: Send + Sync {
    async fn deliver(&self, payload: &DeliveryPayload<'_>) -> Result<(), DeliveryError>;
}
