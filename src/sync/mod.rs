//! Offline-first synchronization between the local store and the linked
//! spreadsheet.
//!
//! One merge round pulls both sides, partitions records by sync id, asks
//! the user to settle true conflicts, then pushes the merged set back. The
//! round is idempotent: a failure mid-merge is recovered by simply running
//! the next round, never by rollback.

mod conflict;
mod engine;

pub use conflict::{Conflict, ConflictChoice, PendingSync, Resolution};
pub use engine::{
    LoadOutcome, MergeReport, SheetTarget, SkipReason, SyncEngine, SyncOutcome, SyncStatus,
};

use thiserror::Error;

use crate::db::StoreError;
use crate::sheets::RemoteError;

/// Terminal failure of one sync round. Local writes that already committed
/// stay; the next round converges again.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("no spreadsheet linked")]
    NoTarget,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("a sync round is already in progress")]
    Busy,

    #[error("no sync round is awaiting conflict resolution")]
    NoPendingResolution,
}
