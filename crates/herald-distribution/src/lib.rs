//! `herald-distribution`: persisted, prioritised queue of outbound posts and
//! the worker that fans each post out to its target platforms.
//!
//! # Overview
//!
//! Items live in the SQLite `distribution_queue` table. The
//! [`engine::DistributionWorker`] claims due items (highest priority first,
//! then oldest `scheduled_at`), posts each one to all of its platforms
//! concurrently through a [`herald_channels::PlatformSet`], and records the
//! per-platform results. Items are never deleted; the table doubles as the
//! audit log.
//!
//! # Status machine
//!
//! | From         | To           | When                                              |
//! |--------------|--------------|---------------------------------------------------|
//! | `pending`    | `processing` | claimed by a batch (`scheduled_at <= now`)        |
//! | `processing` | `posted`     | every platform succeeded                          |
//! | `processing` | `partial`    | some succeeded, some failed (terminal)            |
//! | `processing` | `pending`    | all failed, `retry_count + 1 < max_retries`       |
//! | `processing` | `failed`     | all failed, `retry_count + 1 >= max_retries`      |
//! | `failed`     | `pending`    | manual retry, `retry_count` reset to 0            |
//! | `processing` | `pending`    | stale claim recovered at worker start-up          |

pub mod db;
pub mod engine;
pub mod error;
pub mod state;
pub mod store;
pub mod types;

pub use engine::{DistributionWorker, WorkerSettings};
pub use error::{QueueError, Result};
pub use store::QueueStore;
pub use types::{BatchReport, NewPost, QueueCounts, QueueItem, QueueStatus};
