//! Domain module - Core sync rules and entities
//! 
//! This module contains the watermark, window, record and batch types
//! plus the collaborator traits the sync engine is written against.
//! 
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod auth_session;
pub mod date_window;
pub mod errors;
pub mod lead;
pub mod services;
pub mod sync_batch;
pub mod watermark;

// Re-export commonly used items for convenience
pub use auth_session::{AuthSession, BrowserCookie, Credentials};
pub use date_window::{DateWindow, plan_windows};
pub use errors::{
    AuthenticationError, BrowserError, ConfigurationError, CursorError, DeliveryError,
    ExtractionError, SyncError,
};
pub use lead::{LeadPage, NormalizedRecord, RawLeadRecord, normalize_value};
pub use sync_batch::{DeliveryMeta, DeliveryPayload, SyncBatch};
pub use watermark::{EPOCH_SENTINEL, SyncMode, Watermark, WatermarkError};
