//! Steam library reconciliation.
//!
//! Matches titles installed in one or more Steam library roots against
//! the tracked [`GameRegistry`](savekeep_games::GameRegistry).
//!
//! # Flow
//!
//! 1. **Load**: library roots from settings, ignore list from the state dir
//! 2. **Scan**: enumerate complete app manifests across all roots
//! 3. **Classify**: registered vs unregistered, ignored appids excluded
//! 4. **Reconcile**: push install paths (and optionally names) into
//!    matching games and persist them

pub mod error;
pub mod ignore;
pub mod manager;

// Re-export primary types for convenience.
pub use error::LibraryError;
pub use ignore::IgnoreList;
pub use manager::{AppidMismatch, InstalledApp, LibraryAdd, LibraryManager, ReconcileReport};
