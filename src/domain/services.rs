//! Domain services
//! 
//! Collaborator seams of the sync pipeline.

pub mod sync_services;

pub use sync_services::{BrowserDriver, CursorStore, LeadPortal, WebhookSink};
