//! Display grouping of fetched tasks.
//!
//! # Responsibility
//! - Partition an already-fetched task list for display.
//! - Keep group order identical to `TaskQuery::AllGrouped`.
//!
//! # Invariants
//! - Filtered mode always yields exactly one group, even when empty.
//! - Show-all mode orders groups by project name and puts unassigned last.
//! - Tasks inside a group are sorted `priority ASC, id ASC`.

use crate::model::project::{Project, ProjectId};
use crate::model::task::{Partition, Task};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Label shown for the unassigned partition and unknown projects.
pub const UNASSIGNED_LABEL: &str = "No Project";

/// Which tasks a board shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "partition", rename_all = "snake_case")]
pub enum TaskFilter {
    /// Every partition, grouped.
    #[default]
    All,
    /// A single partition in priority order.
    Partition(Partition),
}

/// One partition's tasks in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroup {
    pub partition: Partition,
    pub label: String,
    pub tasks: Vec<Task>,
}

/// Sort key for show-all mode.
///
/// Variant order makes every project sort before `Unassigned`. A project with
/// no known name gets `None`, which sorts first like SQL `NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupSortKey<'a> {
    Project {
        name: Option<&'a str>,
        id: ProjectId,
    },
    Unassigned,
}

impl GroupSortKey<'_> {
    fn partition(self) -> Partition {
        match self {
            Self::Project { id, .. } => Partition::Project(id),
            Self::Unassigned => Partition::Unassigned,
        }
    }
}

/// Groups `tasks` for display according to `filter`.
pub fn group_tasks(tasks: Vec<Task>, projects: &[Project], filter: TaskFilter) -> Vec<TaskGroup> {
    let names = project_names(projects);
    match filter {
        TaskFilter::Partition(partition) => {
            let mut selected = tasks
                .into_iter()
                .filter(|task| task.partition == partition)
                .collect::<Vec<_>>();
            selected.sort_by(Task::cmp_by_priority);
            vec![TaskGroup {
                partition,
                label: label_for(partition, &names),
                tasks: selected,
            }]
        }
        TaskFilter::All => {
            let mut buckets: BTreeMap<GroupSortKey<'_>, Vec<Task>> = BTreeMap::new();
            for task in tasks {
                let key = sort_key(task.partition, &names);
                buckets.entry(key).or_default().push(task);
            }
            buckets
                .into_iter()
                .map(|(key, mut tasks)| {
                    tasks.sort_by(Task::cmp_by_priority);
                    let partition = key.partition();
                    TaskGroup {
                        partition,
                        label: label_for(partition, &names),
                        tasks,
                    }
                })
                .collect()
        }
    }
}

/// Returns the display label of `partition`.
pub fn partition_label(partition: Partition, projects: &[Project]) -> String {
    label_for(partition, &project_names(projects))
}

fn project_names(projects: &[Project]) -> HashMap<ProjectId, &str> {
    projects
        .iter()
        .map(|project| (project.id, project.name.as_str()))
        .collect()
}

fn sort_key<'a>(partition: Partition, names: &HashMap<ProjectId, &'a str>) -> GroupSortKey<'a> {
    match partition {
        Partition::Project(id) => GroupSortKey::Project {
            name: names.get(&id).copied(),
            id,
        },
        Partition::Unassigned => GroupSortKey::Unassigned,
    }
}

fn label_for(partition: Partition, names: &HashMap<ProjectId, &str>) -> String {
    partition
        .project_id()
        .and_then(|id| names.get(&id).copied())
        .unwrap_or(UNASSIGNED_LABEL)
        .to_string()
}
