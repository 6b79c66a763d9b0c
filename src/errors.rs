//! Error types for the completion-tracking core.
//!
//! Library code returns these typed errors; the CLI binary wraps them with
//! `anyhow` context at its edges. Storage failures are propagated unchanged
//! and never retried here. Retry policy belongs to the store implementation
//! or an outer orchestrator.

use thiserror::Error;

use crate::frame::FrameError;
use crate::store::StoreError;

/// Failures of the completion/execution lifecycle.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The task identity cannot be mapped to an object key. Raised before
    /// any I/O is attempted.
    #[error("malformed task identity: {0}")]
    MalformedIdentity(String),

    /// A storage call failed. A failed existence check is reported through
    /// this variant rather than being treated as "incomplete".
    #[error("object store unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// The task body itself failed. No marker and no run metadata were
    /// written; any partial output is left for the next clean pass.
    #[error("task '{task}' failed during execution")]
    TaskExecution {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    /// The task body succeeded but the success marker could not be
    /// recorded. The output exists without being marked complete, so this
    /// must surface loudly. A blind retry would re-run finished work.
    #[error("task '{task}' completed but the success marker at '{path}' could not be recorded")]
    MarkerWriteFailed {
        task: String,
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// No success marker is recorded for the task, so there is no run
    /// metadata to read.
    #[error("task '{0}' has no recorded run: success marker not found")]
    NotComplete(String),

    /// The success marker exists but its content is not valid run
    /// metadata. Completion checks ignore content, so the task still
    /// counts as complete; only diagnostics hit this.
    #[error("success marker at '{path}' holds malformed run metadata")]
    MalformedMarker {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A dataset read or write through the frame layer failed.
    #[error(transparent)]
    Dataset(#[from] FrameError),
}
