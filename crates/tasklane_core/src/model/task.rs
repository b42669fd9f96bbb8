//! Task domain model and partition key.
//!
//! # Invariants
//! - `priority` is strictly positive.
//! - Ordering inside one partition is `priority ASC, id ASC`.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Maximum accepted length of task and project names, in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Ordering scope of a task.
///
/// Tasks with no project form their own partition instead of a `NULL`
/// sentinel, so every partition key compares and hashes like any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "project_id", rename_all = "snake_case")]
pub enum Partition {
    /// Tasks not associated with any project.
    #[default]
    Unassigned,
    /// Tasks of one project.
    Project(ProjectId),
}

impl Partition {
    /// Builds a partition from a nullable project reference.
    pub fn from_project_id(project_id: Option<ProjectId>) -> Self {
        match project_id {
            Some(id) => Self::Project(id),
            None => Self::Unassigned,
        }
    }

    /// Returns the project reference, `None` for the unassigned partition.
    pub fn project_id(self) -> Option<ProjectId> {
        match self {
            Self::Project(id) => Some(id),
            Self::Unassigned => None,
        }
    }

    pub fn is_unassigned(self) -> bool {
        matches!(self, Self::Unassigned)
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unassigned => write!(f, "unassigned"),
            Self::Project(id) => write!(f, "project:{id}"),
        }
    }
}

/// One prioritized task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub partition: Partition,
    /// Display order inside `partition`; lower sorts first.
    pub priority: i64,
}

impl Task {
    /// Compares two tasks by their in-partition order.
    ///
    /// Equal priorities fall back to id so the order stays total.
    pub fn cmp_by_priority(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Which kind of record a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Task,
    Project,
}

impl Display for NameField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Input validation failures, raised before any store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Name is blank after trim.
    EmptyName(NameField),
    /// Name exceeds `MAX_NAME_CHARS`.
    NameTooLong {
        field: NameField,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Another project already uses this name.
    DuplicateProjectName(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName(field) => write!(f, "{field} name must not be blank"),
            Self::NameTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{field} name must be at most {max_chars} characters, got {actual_chars}"
            ),
            Self::DuplicateProjectName(name) => {
                write!(f, "project name has already been taken: `{name}`")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Trims `value` and checks it against name rules.
pub fn normalize_name(value: &str, field: NameField) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyName(field));
    }
    let actual_chars = trimmed.chars().count();
    if actual_chars > MAX_NAME_CHARS {
        return Err(TaskValidationError::NameTooLong {
            field,
            max_chars: MAX_NAME_CHARS,
            actual_chars,
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, NameField, Partition, Task, TaskValidationError, MAX_NAME_CHARS};
    use uuid::Uuid;

    #[test]
    fn normalize_name_trims_and_accepts_limit() {
        assert_eq!(
            normalize_name("  write docs ", NameField::Task).unwrap(),
            "write docs"
        );
        let at_limit = "é".repeat(MAX_NAME_CHARS);
        assert_eq!(
            normalize_name(&at_limit, NameField::Task).unwrap(),
            at_limit
        );
    }

    #[test]
    fn normalize_name_rejects_blank_and_long() {
        assert_eq!(
            normalize_name(" \t", NameField::Project),
            Err(TaskValidationError::EmptyName(NameField::Project))
        );
        let err = normalize_name(&"x".repeat(MAX_NAME_CHARS + 1), NameField::Task).unwrap_err();
        assert!(matches!(
            err,
            TaskValidationError::NameTooLong {
                actual_chars: 256,
                ..
            }
        ));
    }

    #[test]
    fn partition_roundtrips_nullable_project_reference() {
        let id = Uuid::new_v4();
        assert_eq!(Partition::from_project_id(None), Partition::Unassigned);
        assert_eq!(Partition::from_project_id(Some(id)).project_id(), Some(id));
        assert!(Partition::default().is_unassigned());
    }

    #[test]
    fn equal_priorities_fall_back_to_id() {
        let low = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
        let high = Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap();
        let a = Task {
            id: high,
            name: "a".to_string(),
            partition: Partition::Unassigned,
            priority: 1,
        };
        let b = Task {
            id: low,
            name: "b".to_string(),
            partition: Partition::Unassigned,
            priority: 1,
        };
        assert_eq!(a.cmp_by_priority(&b), std::cmp::Ordering::Greater);
    }
}
