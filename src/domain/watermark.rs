//! Watermark cursor and run mode
//!
//! Timestamps are compared as strings throughout the sync. That is only
//! chronological while every value is fixed-width and zero-padded, so a
//! `Watermark` can only be built from a string in exactly that shape.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value persisted before anything was ever delivered
pub const EPOCH_SENTINEL: &str = "1970-01-01 00:00:00";

/// chrono pattern of the sortable timestamp format
pub const WATERMARK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static FIXED_WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("literal pattern compiles")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatermarkError {
    #[error("'{0}' is not in YYYY-MM-DD HH:MM:SS form")]
    NotFixedWidth(String),

    #[error("'{0}' is not a valid calendar time")]
    NotACalendarTime(String),
}

/// Newest `created_at` already delivered downstream
///
/// Ordering is the derived string ordering, which matches chronological order
/// because of the format check in [`Watermark::parse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Watermark(String);

impl Watermark {
    pub fn parse(value: &str) -> Result<Self, WatermarkError> {
        if !FIXED_WIDTH.is_match(value) {
            return Err(WatermarkError::NotFixedWidth(value.to_string()));
        }
        NaiveDateTime::parse_from_str(value, WATERMARK_FORMAT)
            .map_err(|_| WatermarkError::NotACalendarTime(value.to_string()))?;
        Ok(Self(value.to_string()))
    }

    pub fn epoch() -> Self {
        Self(EPOCH_SENTINEL.to_string())
    }

    pub fn is_epoch(&self) -> bool {
        self.0 == EPOCH_SENTINEL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Watermark {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Watermark {
    type Error = WatermarkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Watermark> for String {
    fn from(value: Watermark) -> Self {
        value.0
    }
}

/// How a run decides which records to forward, fixed once at run start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMode {
    /// No prior cursor: forward every record in the window set
    Backfill,
    /// Forward only records created strictly after the watermark
    Incremental(Watermark),
}

impl SyncMode {
    pub fn from_watermark(watermark: Watermark) -> Self {
        if watermark.is_epoch() {
            Self::Backfill
        } else {
            Self::Incremental(watermark)
        }
    }

    pub const fn is_backfill(&self) -> bool {
        matches!(self, Self::Backfill)
    }

    /// Watermark the run started from (the sentinel for backfill)
    pub fn watermark(&self) -> Watermark {
        match self {
            Self::Backfill => Watermark::epoch(),
            Self::Incremental(watermark) => watermark.clone(),
        }
    }

    /// Inclusion policy for a normalized `created_at` value.
    ///
    /// Values that are not valid watermark strings cannot be ordered against
    /// the cursor and are excluded in incremental mode.
    pub fn includes(&self, created_at: &str) -> bool {
        match self {
            Self::Backfill => true,
            Self::Incremental(watermark) => Watermark::parse(created_at)
                .map(|candidate| &candidate > watermark)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backfill => f.write_str("BACKFILL"),
            Self::Incremental(_) => f.write_str("INCREMENTAL"),
        }
    }
}
