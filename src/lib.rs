//! Lead Sync - incremental lead export from the project portal
//!
//! Logs into the lead portal, pages through the last few calendar months of
//! leads, keeps the ones newer than the persisted watermark, and posts them to
//! a webhook in one batch. The watermark only advances after delivery succeeds.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::runner::run;
