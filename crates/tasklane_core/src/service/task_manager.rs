//! Task manager use-case service.
//!
//! # Responsibility
//! - Expose user-facing task/project operations over a `TaskStore`.
//! - Compose priority assignment, reorder and grouping into one board view.
//! - Emit one notification per mutating call and log failures with context.
//!
//! # Invariants
//! - View state lives in a caller-owned `Session`; the manager keeps none.
//! - Validation runs before any store mutation.
//! - Priority assignment and task insertion share one atomic unit.
//! - Successful mutations reload `Session::board`.

use crate::model::project::{Project, ProjectId};
use crate::model::task::{
    normalize_name, NameField, Partition, Task, TaskId, TaskValidationError,
};
use crate::repo::task_store::{StoreError, TaskQuery, TaskStore};
use crate::service::grouping::{group_tasks, partition_label, TaskFilter, TaskGroup};
use crate::service::notify::{Notification, Notifier};
use crate::service::ordering::{reorder, OrderingError, ReorderOutcome};
use crate::service::priority::next_priority;
use log::{error, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors from task manager operations.
#[derive(Debug)]
pub enum ManagerError {
    /// Input rejected before touching the store.
    Validation(TaskValidationError),
    /// Task no longer exists; the caller should reload its view.
    TaskNotFound(TaskId),
    /// Referenced project no longer exists.
    ProjectNotFound(ProjectId),
    /// Project name lost a uniqueness race after validation passed.
    ProjectNameConflict(String),
    /// `update_task` was called without `start_editing`.
    NotEditing,
    /// Reorder rolled back.
    Ordering(OrderingError),
    /// Any other store failure.
    Store(StoreError),
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ProjectNameConflict(name) => {
                write!(f, "project name already exists: `{name}`")
            }
            Self::NotEditing => write!(f, "no task is being edited"),
            Self::Ordering(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Ordering(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for ManagerError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<OrderingError> for ManagerError {
    fn from(value: OrderingError) -> Self {
        Self::Ordering(value)
    }
}

impl From<StoreError> for ManagerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::TaskNotFound(id) => Self::TaskNotFound(id),
            StoreError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            StoreError::DuplicateProjectName(name) => Self::ProjectNameConflict(name),
            other => Self::Store(other),
        }
    }
}

/// Display-ready snapshot of projects and grouped tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    /// Projects by name.
    pub projects: Vec<Project>,
    /// Task groups in display order.
    pub groups: Vec<TaskGroup>,
    /// Label of the filtered partition; `None` in show-all mode.
    pub filtered_project_name: Option<String>,
}

impl Board {
    /// Returns the display label of `partition`.
    pub fn project_name(&self, partition: Partition) -> String {
        partition_label(partition, &self.projects)
    }

    /// Total number of tasks on the board.
    pub fn task_count(&self) -> usize {
        self.groups.iter().map(|group| group.tasks.len()).sum()
    }
}

/// Inline rename in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub task_id: TaskId,
    pub name: String,
}

/// Caller-owned view state threaded through manager calls.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Which tasks the board shows.
    pub filter: TaskFilter,
    /// Partition that receives the next created task.
    pub selected_partition: Partition,
    pub editing: Option<EditTarget>,
    pub board: Board,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    CreateTask,
    CreateProject,
    UpdateTask,
    DeleteTask,
    MoveTask,
    DeleteProject,
    UpdateTaskOrder,
}

impl Operation {
    fn event(self) -> &'static str {
        match self {
            Self::CreateTask => "task_create",
            Self::CreateProject => "project_create",
            Self::UpdateTask => "task_update",
            Self::DeleteTask => "task_delete",
            Self::MoveTask => "task_move",
            Self::DeleteProject => "project_delete",
            Self::UpdateTaskOrder => "task_order_update",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::CreateTask => "Task created successfully.",
            Self::CreateProject => "Project created successfully.",
            Self::UpdateTask => "Task updated successfully.",
            Self::DeleteTask => "Task deleted successfully.",
            Self::MoveTask => "Task moved successfully.",
            Self::DeleteProject => "Project deleted successfully.",
            Self::UpdateTaskOrder => "Task order updated successfully.",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            Self::CreateTask => "Error creating task",
            Self::CreateProject => "Error creating project",
            Self::UpdateTask => "Error updating task",
            Self::DeleteTask => "Error deleting task",
            Self::MoveTask => "Error moving task",
            Self::DeleteProject => "Error deleting project",
            Self::UpdateTaskOrder => "Error updating task order",
        }
    }
}

/// Task manager facade.
pub struct TaskManager<S: TaskStore, N: Notifier> {
    store: S,
    notifier: N,
}

impl<S: TaskStore, N: Notifier> TaskManager<S, N> {
    /// Creates a manager from a store and a notification sink.
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reloads projects and tasks into `session.board` for the current filter.
    pub fn load_board(&self, session: &mut Session) -> ManagerResult<()> {
        let projects = self.store.list_projects()?;
        let query = match session.filter {
            TaskFilter::All => TaskQuery::AllGrouped,
            TaskFilter::Partition(partition) => TaskQuery::ByPartition(partition),
        };
        let tasks = self.store.find_tasks(query)?;
        let filtered_project_name = match session.filter {
            TaskFilter::All => None,
            TaskFilter::Partition(partition) => Some(partition_label(partition, &projects)),
        };
        let groups = group_tasks(tasks, &projects, session.filter);

        session.board = Board {
            projects,
            groups,
            filtered_project_name,
        };
        Ok(())
    }

    /// Creates a task at the end of `session.selected_partition`.
    pub fn create_task(&self, session: &mut Session, name: &str) -> ManagerResult<Task> {
        let partition = session.selected_partition;
        let result = self.try_create_task(partition, name);
        let context = format!("partition={partition}");
        self.complete(session, Operation::CreateTask, &context, result)
    }

    /// Creates a project and selects it for the next created task.
    pub fn create_project(&self, session: &mut Session, name: &str) -> ManagerResult<Project> {
        let result = self.try_create_project(name);
        if let Ok(project) = &result {
            session.selected_partition = Partition::Project(project.id);
        }
        let context = format!("name_chars={}", name.chars().count());
        self.complete(session, Operation::CreateProject, &context, result)
    }

    /// Enters inline edit mode for one task.
    pub fn start_editing(&self, session: &mut Session, task_id: TaskId) -> ManagerResult<()> {
        let task = self
            .store
            .get_task(task_id)?
            .ok_or(ManagerError::TaskNotFound(task_id))?;
        session.editing = Some(EditTarget {
            task_id,
            name: task.name,
        });
        Ok(())
    }

    /// Leaves edit mode without saving.
    pub fn cancel_editing(&self, session: &mut Session) {
        session.editing = None;
    }

    /// Saves the task being edited under `name`.
    ///
    /// Edit mode is kept when the save fails so the caller can retry.
    pub fn update_task(&self, session: &mut Session, name: &str) -> ManagerResult<Task> {
        let target = session.editing.as_ref().map(|target| target.task_id);
        let result = match target {
            Some(task_id) => self.try_update_task(task_id, name),
            None => Err(ManagerError::NotEditing),
        };
        if result.is_ok() {
            session.editing = None;
        }
        let context = target
            .map(|task_id| format!("task_id={task_id}"))
            .unwrap_or_default();
        self.complete(session, Operation::UpdateTask, &context, result)
    }

    /// Deletes one task. Siblings keep their priorities.
    pub fn delete_task(&self, session: &mut Session, task_id: TaskId) -> ManagerResult<()> {
        let result = self.store.delete_task(task_id).map_err(ManagerError::from);
        if result.is_ok()
            && session
                .editing
                .as_ref()
                .is_some_and(|target| target.task_id == task_id)
        {
            session.editing = None;
        }
        let context = format!("task_id={task_id}");
        self.complete(session, Operation::DeleteTask, &context, result)
    }

    /// Switches the board filter and reloads.
    pub fn filter_by(&self, session: &mut Session, filter: TaskFilter) -> ManagerResult<()> {
        session.filter = filter;
        self.load_board(session).inspect_err(|err| {
            error!("event=board_load module=manager status=error filter={filter:?} error={err}");
        })
    }

    /// Applies a drag-and-drop result to `partition`.
    pub fn update_task_order(
        &self,
        session: &mut Session,
        partition: Partition,
        ordered_ids: &[TaskId],
    ) -> ManagerResult<ReorderOutcome> {
        let result = reorder(&self.store, partition, ordered_ids).map_err(ManagerError::from);
        let context = format!("partition={partition} ordered_count={}", ordered_ids.len());
        self.complete(session, Operation::UpdateTaskOrder, &context, result)
    }

    /// Moves one task to the end of another partition.
    ///
    /// Moving a task to its current partition leaves it untouched.
    pub fn move_task(
        &self,
        session: &mut Session,
        task_id: TaskId,
        partition: Partition,
    ) -> ManagerResult<Task> {
        let result = self.try_move_task(task_id, partition);
        let context = format!("task_id={task_id} partition={partition}");
        self.complete(session, Operation::MoveTask, &context, result)
    }

    /// Deletes one project; its tasks are appended to the unassigned partition.
    ///
    /// Returns how many tasks were re-homed.
    pub fn delete_project(
        &self,
        session: &mut Session,
        project_id: ProjectId,
    ) -> ManagerResult<usize> {
        let result = self
            .store
            .delete_project_dissolve(project_id)
            .map_err(ManagerError::from);
        if result.is_ok() {
            let deleted = Partition::Project(project_id);
            if session.selected_partition == deleted {
                session.selected_partition = Partition::Unassigned;
            }
            if session.filter == TaskFilter::Partition(deleted) {
                session.filter = TaskFilter::All;
            }
        }
        let context = format!("project_id={project_id}");
        self.complete(session, Operation::DeleteProject, &context, result)
    }

    fn try_create_task(&self, partition: Partition, name: &str) -> ManagerResult<Task> {
        let name = normalize_name(name, NameField::Task)?;
        self.ensure_partition_exists(partition)?;
        let task = self.store.atomically(|store| {
            let priority = next_priority(store, partition)?;
            store.create_task(&name, partition, priority)
        })?;
        Ok(task)
    }

    fn try_create_project(&self, name: &str) -> ManagerResult<Project> {
        let name = normalize_name(name, NameField::Project)?;
        if self.store.project_name_exists(&name)? {
            return Err(TaskValidationError::DuplicateProjectName(name).into());
        }
        Ok(self.store.create_project(&name)?)
    }

    fn try_update_task(&self, task_id: TaskId, name: &str) -> ManagerResult<Task> {
        let name = normalize_name(name, NameField::Task)?;
        Ok(self.store.update_task_name(task_id, &name)?)
    }

    fn try_move_task(&self, task_id: TaskId, partition: Partition) -> ManagerResult<Task> {
        self.ensure_partition_exists(partition)?;
        let task = self.store.atomically(|store| {
            let task = store
                .get_task(task_id)?
                .ok_or(StoreError::TaskNotFound(task_id))?;
            if task.partition == partition {
                return Ok(task);
            }
            let priority = next_priority(store, partition)?;
            store.move_task(task_id, partition, priority)
        })?;
        Ok(task)
    }

    fn ensure_partition_exists(&self, partition: Partition) -> ManagerResult<()> {
        if let Partition::Project(project_id) = partition {
            if self.store.get_project(project_id)?.is_none() {
                return Err(ManagerError::ProjectNotFound(project_id));
            }
        }
        Ok(())
    }

    fn complete<T>(
        &self,
        session: &mut Session,
        operation: Operation,
        context: &str,
        result: ManagerResult<T>,
    ) -> ManagerResult<T> {
        match result {
            Ok(value) => {
                info!(
                    "event={} module=manager status=ok {}",
                    operation.event(),
                    context
                );
                if let Err(err) = self.load_board(session) {
                    warn!(
                        "event=board_load module=manager status=error after={} error={}",
                        operation.event(),
                        err
                    );
                }
                self.notifier
                    .notify(Notification::success(operation.success_message()));
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event={} module=manager status=error {} error={}",
                    operation.event(),
                    context,
                    err
                );
                self.notifier.notify(Notification::error(format!(
                    "{}: {err}",
                    operation.failure_prefix()
                )));
                Err(err)
            }
        }
    }
}
