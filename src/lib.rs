//! # Ecoguard - energy consumption collector for the Ecoguard tenant portal
//!
//! Logs in to the Ecoguard Insight portal once per refresh cycle, scrapes
//! the consumption tables and the price list, and reconciles them into one
//! energy series and one cost series suitable for a long-term statistics
//! store. The last-known values are also exposed as flat sensor fields.
//!
//! ## Architecture
//!
//! - `normalize`: locale-aware numbers, diacritic stripping, Swedish month names
//! - `table`: HTML table rows and the JSON price list
//! - `consumption`: record types and per-table parsers
//! - `session`: login handshake and authenticated HTTP session
//! - `portal`: endpoint seam used by the refresh cycle
//! - `history`: month and rate caches, series reconciliation
//! - `statistics`: cumulative statistic records and sinks
//! - `snapshot`: sensor projection of one cycle
//! - `coordinator`: one refresh cycle for one account
//! - `scheduler`: periodic refresh with last-known status
//! - `config`, `logging`, `persistence`, `error`: ambient plumbing

pub mod config;
pub mod consumption;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod logging;
pub mod normalize;
pub mod persistence;
pub mod portal;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod statistics;
pub mod table;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::Coordinator;
pub use error::{EcoguardError, Result};
pub use portal::{HttpConnector, Portal, PortalConnector};
pub use scheduler::{RefreshStatus, Scheduler};
pub use snapshot::Snapshot;
