//! Explicit reorder of one partition.
//!
//! # Responsibility
//! - Turn a caller-supplied id sequence into consecutive priorities `1..N`.
//! - Apply the rewrite as one all-or-nothing store unit.
//!
//! # Invariants
//! - Position `i` (0-based) in the input always maps to priority `i + 1`.
//! - Ids that do not belong to the partition are skipped, never moved.
//! - Tasks of the partition missing from the input keep their old priority.
//! - Re-running the same input yields the same priorities.

use crate::model::task::{Partition, TaskId};
use crate::repo::task_store::{StoreError, TaskStore};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Summary of one committed reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub partition: Partition,
    /// Number of ids supplied by the caller.
    pub requested: usize,
    /// Number of distinct rows rewritten; smaller than `requested` when ids
    /// repeat, fall outside the partition, or no longer exist.
    pub applied: usize,
}

/// Errors from the ordering engine.
#[derive(Debug)]
pub enum OrderingError {
    /// The atomic rewrite did not commit; no priority changed.
    Transaction {
        partition: Partition,
        source: StoreError,
    },
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transaction { partition, source } => {
                write!(f, "reorder of {partition} was rolled back: {source}")
            }
        }
    }
}

impl Error for OrderingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transaction { source, .. } => Some(source),
        }
    }
}

/// Rewrites priorities of `partition` to follow `ordered_ids`.
pub fn reorder<S: TaskStore>(
    store: &S,
    partition: Partition,
    ordered_ids: &[TaskId],
) -> Result<ReorderOutcome, OrderingError> {
    let started_at = Instant::now();
    let assignments = ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index as i64 + 1))
        .collect::<Vec<_>>();

    match store.update_many_priorities(partition, &assignments) {
        Ok(applied) => {
            info!(
                "event=task_reorder module=ordering status=ok partition={} requested={} applied={} duration_ms={}",
                partition,
                ordered_ids.len(),
                applied,
                started_at.elapsed().as_millis()
            );
            Ok(ReorderOutcome {
                partition,
                requested: ordered_ids.len(),
                applied,
            })
        }
        Err(source) => {
            error!(
                "event=task_reorder module=ordering status=error partition={} ordered_ids={} duration_ms={} error={}",
                partition,
                join_ids(ordered_ids),
                started_at.elapsed().as_millis(),
                source
            );
            Err(OrderingError::Transaction { partition, source })
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
