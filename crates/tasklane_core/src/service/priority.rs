//! Priority assignment for newly created or moved tasks.
//!
//! # Invariants
//! - The result is always `>= 1`.
//! - A partition whose maximum is `i64::MAX` reports `InvalidData` instead of
//!   wrapping.
//! - Reads only; callers that create a task with the result must do both in
//!   one `TaskStore::atomically` unit.

use crate::model::task::Partition;
use crate::repo::task_store::{StoreError, StoreResult, TaskStore};

/// Returns the priority that appends a task to the end of `partition`.
///
/// An empty partition yields `1`.
pub fn next_priority<S: TaskStore>(store: &S, partition: Partition) -> StoreResult<i64> {
    let max = store.max_priority(partition)?.unwrap_or(0);
    max.checked_add(1).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "no priority left after {max} in partition {partition}"
        ))
    })
}
