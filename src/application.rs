//! Application layer module
//!
//! This module contains the sync pipeline stages and the run orchestration
//! that ties the domain to the infrastructure.

pub mod paginated_extractor;
pub mod polling;
pub mod runner;
pub mod session_authenticator;
pub mod sync_engine;
pub mod validated_config;

pub use paginated_extractor::extract;
pub use polling::{TimeoutError, await_condition};
pub use session_authenticator::{AuthSettings, SessionAuthenticator};
pub use sync_engine::{EngineSettings, RunOutcome, SyncContext, SyncEngine};
pub use validated_config::ValidatedSyncConfig;
