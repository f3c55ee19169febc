//! One sync run: cursor → login → windows → pages → filter → deliver → commit
//!
//! Every step runs in sequence. Any error ends the run before the cursor is
//! touched, and the browser context is closed on every exit path.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::paginated_extractor::extract;
use crate::application::session_authenticator::SessionAuthenticator;
use crate::domain::auth_session::{AuthSession, Credentials};
use crate::domain::date_window::plan_windows;
use crate::domain::errors::SyncError;
use crate::domain::lead::NormalizedRecord;
use crate::domain::services::{BrowserDriver, CursorStore, LeadPortal, WebhookSink};
use crate::domain::sync_batch::{DeliveryPayload, SyncBatch};
use crate::domain::watermark::{SyncMode, Watermark};

/// Run-shaping settings that are fixed for the lifetime of the process
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub month_count: u32,
    pub project_id: u32,
    pub source_tag: String,
    pub backfill_label: String,
    pub incremental_label: String,
    pub max_pages_per_window: u32,
}

impl EngineSettings {
    pub fn mode_label(&self, mode: &SyncMode) -> &str {
        match mode {
            SyncMode::Backfill => &self.backfill_label,
            SyncMode::Incremental(_) => &self.incremental_label,
        }
    }
}

/// State decided once at run start and handed to each stage
#[derive(Debug)]
pub struct SyncContext {
    pub mode: SyncMode,
    pub session: AuthSession,
    pub run_id: Uuid,
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Records were delivered; `watermark` is the committed cursor, if any
    Delivered {
        count: usize,
        watermark: Option<Watermark>,
    },
    /// Nothing passed the filter; no delivery, cursor untouched
    NothingNew,
}

pub struct SyncEngine {
    cursor_store: Arc<dyn CursorStore>,
    portal: Arc<dyn LeadPortal>,
    webhook: Arc<dyn WebhookSink>,
    authenticator: SessionAuthenticator,
    settings: EngineSettings,
    cancellation: CancellationToken,
}

impl SyncEngine {
    pub fn new(
        cursor_store: Arc<dyn CursorStore>,
        portal: Arc<dyn LeadPortal>,
        webhook: Arc<dyn WebhookSink>,
        authenticator: SessionAuthenticator,
        settings: EngineSettings,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            cursor_store,
            portal,
            webhook,
            authenticator,
            settings,
            cancellation,
        }
    }

    /// Execute one run against `browser`, which is closed before returning
    pub async fn run(
        &self,
        browser: &mut dyn BrowserDriver,
        credentials: &Credentials,
        today: NaiveDate,
    ) -> Result<RunOutcome, SyncError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sync_run", %run_id);

        async move {
            let result = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(SyncError::Cancelled),
                result = self.execute(&mut *browser, credentials, today, run_id) => result,
            };

            if let Err(error) = browser.close().await {
                tracing::warn!(%error, "Failed to close browser context");
            }

            match &result {
                Ok(outcome) => tracing::info!(?outcome, "Sync run finished"),
                Err(error) => tracing::error!(%error, "Sync run failed, cursor not advanced"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        browser: &mut dyn BrowserDriver,
        credentials: &Credentials,
        today: NaiveDate,
        run_id: Uuid,
    ) -> Result<RunOutcome, SyncError> {
        let mode = SyncMode::from_watermark(self.cursor_store.load().await?);
        tracing::info!(%mode, watermark = %mode.watermark(), "Starting sync run");

        let session = self.authenticator.authenticate(browser, credentials).await?;
        let context = SyncContext {
            mode,
            session,
            run_id,
        };

        let batch = self.collect_batch(&context, today).await?;
        if batch.is_empty() {
            tracing::info!("No new records, skipping delivery");
            return Ok(RunOutcome::NothingNew);
        }

        let label = self.settings.mode_label(&context.mode);
        let payload = DeliveryPayload::new(
            &batch,
            &self.settings.source_tag,
            self.settings.project_id,
            label,
        );
        tracing::info!(records = batch.len(), mode = label, "Delivering batch");
        self.webhook.deliver(&payload).await?;

        let watermark = batch.next_watermark(&context.mode.watermark());
        match &watermark {
            Some(next) => self.cursor_store.commit(next).await?,
            None => tracing::warn!("Delivered records carry no usable created_at, cursor unchanged"),
        }

        Ok(RunOutcome::Delivered {
            count: batch.len(),
            watermark,
        })
    }

    /// Walk every planned window, most recent first, keeping records the mode admits
    async fn collect_batch(
        &self,
        context: &SyncContext,
        today: NaiveDate,
    ) -> Result<SyncBatch, SyncError> {
        let windows = plan_windows(today, self.settings.month_count);
        let mut batch = SyncBatch::new();

        for window in &windows {
            if self.cancellation.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let mut records = std::pin::pin!(extract(
                self.portal.as_ref(),
                window,
                &context.session,
                self.settings.max_pages_per_window,
            ));

            let (mut seen, mut kept) = (0usize, 0usize);
            while let Some(raw) = records.try_next().await? {
                seen += 1;
                let record = NormalizedRecord::from_raw(&raw);
                if context.mode.includes(&record.created_at) {
                    batch.push(record);
                    kept += 1;
                }
            }
            tracing::info!(%window, seen, kept, "Window extracted");
        }

        Ok(batch)
    }
}
