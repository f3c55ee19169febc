//! Batch accumulated over one run and the envelope it is delivered in

use serde::Serialize;

use crate::domain::lead::NormalizedRecord;
use crate::domain::watermark::Watermark;

/// Records selected during one run, in extraction order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncBatch {
    records: Vec<NormalizedRecord>,
}

impl SyncBatch {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Cursor value to commit once this batch has been delivered.
    ///
    /// The maximum `created_at` across the batch, never below `current`.
    /// Values that are not valid watermarks are skipped; `None` means there is
    /// nothing to advance to.
    pub fn next_watermark(&self, current: &Watermark) -> Option<Watermark> {
        self.records
            .iter()
            .filter_map(|record| Watermark::parse(&record.created_at).ok())
            .max()
            .map(|newest| newest.max(current.clone()))
    }
}

impl FromIterator<NormalizedRecord> for SyncBatch {
    fn from_iter<I: IntoIterator<Item = NormalizedRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Metadata sent alongside the records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryMeta {
    pub source: String,
    pub project_id: u32,
    pub mode: String,
    pub total_records: usize,
}

/// Webhook body: `{ meta, records }`
#[derive(Debug, Serialize)]
pub struct DeliveryPayload<'a> {
    pub meta: DeliveryMeta,
    pub records: &'a [NormalizedRecord],
}

impl<'a> DeliveryPayload<'a> {
    pub fn new(batch: &'a SyncBatch, source: &str, project_id: u32, mode: &str) -> Self {
        Self {
            meta: DeliveryMeta {
                source: source.to_string(),
                project_id,
                mode: mode.to_string(),
                total_records: batch.len(),
            },
            records: batch.records(),
        }
    }
}
