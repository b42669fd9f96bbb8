//! Task prioritization and grouping engine for Tasklane.
//! This crate is the single source of truth for ordering invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::project::{Project, ProjectId};
pub use model::task::{
    normalize_name, NameField, Partition, Task, TaskId, TaskValidationError, MAX_NAME_CHARS,
};
pub use repo::task_store::{SqliteTaskStore, StoreError, StoreResult, TaskQuery, TaskStore};
pub use service::grouping::{group_tasks, partition_label, TaskFilter, TaskGroup, UNASSIGNED_LABEL};
pub use service::notify::{CollectingNotifier, Notification, NotificationLevel, Notifier};
pub use service::ordering::{reorder, OrderingError, ReorderOutcome};
pub use service::priority::next_priority;
pub use service::task_manager::{
    Board, EditTarget, ManagerError, ManagerResult, Session, TaskManager,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
