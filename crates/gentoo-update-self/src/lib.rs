//! Self-update functionality for gentoo-update
//!
//! Provides:
//! - Download of the published release into a scratch file
//! - Integrity and revision checks on the downloaded bytes
//! - In-place replacement of the running program behind a `.old` backup
//! - Rollback to the backup whenever the candidate is rejected or the
//!   update is interrupted

pub mod download;
pub mod updater;

pub use download::{HttpFetcher, PayloadFetcher};
pub use updater::{InterruptRecovery, MarkerPatterns, SelfUpdater, UpdateResult};
