//! Job store contract and in-memory backend.
//!
//! The orchestrator talks to job storage through the [`JobStore`] trait so
//! the same logic runs against a durable backend or the bundled
//! [`MemoryJobStore`]. Implementations enforce the record-level guards
//! (terminal freeze, state machine legality for status changes,
//! first-write-wins deployment ids, monotonic `updatedAt`); when
//! transitions happen is the orchestrator's call.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use slipway_job::{JobPatch, NewJob, PublishJob};

mod memory;

pub use memory::MemoryJobStore;

/// Boxed future returned by [`JobStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors produced by job store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Keyed store of publish job records.
///
/// May be durable or in-memory. Callers get single-writer-per-job
/// semantics within one process; concurrent updates to the same job are
/// last-write-wins, not serialized beyond the backend's own locking.
pub trait JobStore: Send + Sync {
    /// Creates a `queued` job with a fresh id and returns the record.
    fn create(&self, new_job: NewJob) -> StoreFuture<'_, PublishJob>;

    /// Fetches a job by id.
    fn get<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<PublishJob>>;

    /// Merges `Some` patch fields into the job and refreshes `updatedAt`.
    ///
    /// Returns `None` for an unknown id. A patch against a terminal
    /// record, or one whose status change the state machine forbids, is
    /// ignored entirely and the stored record is returned unchanged.
    fn update<'a>(&'a self, id: &'a str, patch: JobPatch)
    -> StoreFuture<'a, Option<PublishJob>>;

    /// Removes terminal jobs created before `cutoff`, returning how many
    /// were removed. Active jobs are never purged.
    fn purge_created_before(&self, cutoff: DateTime<Utc>) -> StoreFuture<'_, usize>;
}
