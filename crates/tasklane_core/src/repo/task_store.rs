//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for tasks, projects and partition priorities.
//! - Keep SQL details and ordering behavior inside the store boundary.
//!
//! # Invariants
//! - Partition listing is deterministic: `priority ASC, id ASC`.
//! - Grouped listing puts named projects first by `name ASC`, unassigned last.
//! - Bulk priority rewrites and project dissolves are all-or-nothing.
//! - Every priority write is scoped to its partition; rows elsewhere are
//!   never touched.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::project::{Project, ProjectId};
use crate::model::task::{Partition, Task, TaskId};
use rusqlite::{params, Connection, ErrorCode, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.name AS name,
    t.project_id AS project_id,
    t.priority AS priority
FROM tasks t";

/// Result type used by task store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Target or referenced project does not exist.
    ProjectNotFound(ProjectId),
    /// Unique index rejected a project name.
    DuplicateProjectName(String),
    /// Priority values must be strictly positive.
    InvalidPriority(i64),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::DuplicateProjectName(name) => {
                write!(f, "project name already exists: `{name}`")
            }
            Self::InvalidPriority(value) => {
                write!(f, "priority must be a positive integer, got {value}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task store requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query shapes supported by `TaskStore::find_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskQuery {
    /// Tasks of one partition, `priority ASC, id ASC`.
    ByPartition(Partition),
    /// Every task, grouped by project name with unassigned tasks last.
    AllGrouped,
}

/// Persistence contract consumed by the ordering engine and task manager.
pub trait TaskStore {
    /// Lists tasks in the order defined by `query`.
    fn find_tasks(&self, query: TaskQuery) -> StoreResult<Vec<Task>>;
    /// Loads one task by id.
    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    /// Highest priority in the partition, `None` when it is empty.
    fn max_priority(&self, partition: Partition) -> StoreResult<Option<i64>>;
    /// Inserts one task with a caller-computed priority.
    fn create_task(&self, name: &str, partition: Partition, priority: i64) -> StoreResult<Task>;
    /// Renames one task.
    fn update_task_name(&self, id: TaskId, name: &str) -> StoreResult<Task>;
    /// Removes one task. Siblings keep their priorities.
    fn delete_task(&self, id: TaskId) -> StoreResult<()>;
    /// Applies `(id, priority)` pairs inside `partition` as one atomic unit.
    ///
    /// Ids outside the partition are skipped. Returns the number of distinct
    /// rows rewritten; a repeated id counts once.
    fn update_many_priorities(
        &self,
        partition: Partition,
        assignments: &[(TaskId, i64)],
    ) -> StoreResult<usize>;
    /// Re-homes one task into `partition` at `priority`.
    fn move_task(&self, id: TaskId, partition: Partition, priority: i64) -> StoreResult<Task>;
    /// Lists projects by `name ASC`.
    fn list_projects(&self) -> StoreResult<Vec<Project>>;
    /// Loads one project by id.
    fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>>;
    /// Returns whether a project already uses `name`.
    fn project_name_exists(&self, name: &str) -> StoreResult<bool>;
    /// Inserts one project.
    fn create_project(&self, name: &str) -> StoreResult<Project>;
    /// Deletes one project and appends its tasks to the unassigned partition.
    ///
    /// Returns the number of tasks that were re-homed.
    fn delete_project_dissolve(&self, id: ProjectId) -> StoreResult<usize>;
    /// Runs `work` inside one write transaction.
    ///
    /// `work` must not call operations that open their own transaction
    /// (`update_many_priorities`, `delete_project_dissolve`).
    fn atomically<T, F>(&self, work: F) -> StoreResult<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> StoreResult<T>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn find_tasks(&self, query: TaskQuery) -> StoreResult<Vec<Task>> {
        let mut items = Vec::new();
        match query {
            TaskQuery::ByPartition(partition) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{TASK_SELECT_SQL}
                     WHERE t.project_id IS ?1
                     ORDER BY t.priority ASC, t.id ASC;"
                ))?;
                let mut rows = stmt.query([partition_to_db(partition)])?;
                while let Some(row) = rows.next()? {
                    items.push(parse_task_row(row)?);
                }
            }
            TaskQuery::AllGrouped => {
                let mut stmt = self.conn.prepare(&format!(
                    "{TASK_SELECT_SQL}
                     LEFT JOIN projects p ON p.id = t.project_id
                     ORDER BY
                        CASE WHEN t.project_id IS NULL THEN 1 ELSE 0 END ASC,
                        p.name ASC,
                        t.project_id ASC,
                        t.priority ASC,
                        t.id ASC;"
                ))?;
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    items.push(parse_task_row(row)?);
                }
            }
        }
        Ok(items)
    }

    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn max_priority(&self, partition: Partition) -> StoreResult<Option<i64>> {
        let value = self.conn.query_row(
            "SELECT MAX(priority)
             FROM tasks
             WHERE project_id IS ?1;",
            [partition_to_db(partition)],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(value)
    }

    fn create_task(&self, name: &str, partition: Partition, priority: i64) -> StoreResult<Task> {
        ensure_positive_priority(priority)?;
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO tasks (id, name, project_id, priority)
                 VALUES (?1, ?2, ?3, ?4);",
                params![id.to_string(), name, partition_to_db(partition), priority],
            )
            .map_err(|err| map_partition_write_error(err, partition))?;
        load_required_task(self.conn, id)
    }

    fn update_task_name(&self, id: TaskId, name: &str) -> StoreResult<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET name = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        load_required_task(self.conn, id)
    }

    fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        Ok(())
    }

    fn update_many_priorities(
        &self,
        partition: Partition,
        assignments: &[(TaskId, i64)],
    ) -> StoreResult<usize> {
        for &(_, priority) in assignments {
            ensure_positive_priority(priority)?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut changed = HashSet::new();
        {
            let mut stmt = tx.prepare(
                "UPDATE tasks
                 SET priority = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND project_id IS ?3;",
            )?;
            for &(id, priority) in assignments {
                let rows = stmt.execute(params![
                    id.to_string(),
                    priority,
                    partition_to_db(partition)
                ])?;
                if rows > 0 {
                    changed.insert(id);
                }
            }
        }
        tx.commit()?;
        Ok(changed.len())
    }

    fn move_task(&self, id: TaskId, partition: Partition, priority: i64) -> StoreResult<Task> {
        ensure_positive_priority(priority)?;
        let changed = self
            .conn
            .execute(
                "UPDATE tasks
                 SET project_id = ?2,
                     priority = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), partition_to_db(partition), priority],
            )
            .map_err(|err| map_partition_write_error(err, partition))?;
        if changed == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        load_required_task(self.conn, id)
    }

    fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name
             FROM projects
             ORDER BY name ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_project_row(row)?);
        }
        Ok(items)
    }

    fn get_project(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        load_project(self.conn, id)
    }

    fn project_name_exists(&self, name: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_project(&self, name: &str) -> StoreResult<Project> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO projects (id, name) VALUES (?1, ?2);",
                params![id.to_string(), name],
            )
            .map_err(|err| {
                if is_constraint(&err, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) {
                    StoreError::DuplicateProjectName(name.to_string())
                } else {
                    err.into()
                }
            })?;
        load_project(self.conn, id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("created project {id} not found in read-back"))
        })
    }

    fn delete_project_dissolve(&self, id: ProjectId) -> StoreResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_project(&tx, id)?.is_none() {
            return Err(StoreError::ProjectNotFound(id));
        }

        let children = list_task_ids(&tx, Partition::Project(id))?;
        let base_priority = next_priority_in(&tx, Partition::Unassigned)?;
        for (index, task_id) in children.iter().enumerate() {
            let priority = i64::try_from(index)
                .ok()
                .and_then(|offset| base_priority.checked_add(offset))
                .ok_or_else(|| {
                    StoreError::InvalidData(format!(
                        "no priority left after {base_priority} in partition {}",
                        Partition::Unassigned
                    ))
                })?;
            tx.execute(
                "UPDATE tasks
                 SET project_id = NULL,
                     priority = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![task_id.to_string(), priority],
            )?;
        }

        tx.execute("DELETE FROM projects WHERE id = ?1;", [id.to_string()])?;
        tx.commit()?;
        Ok(children.len())
    }

    fn atomically<T, F>(&self, work: F) -> StoreResult<T>
    where
        F: FnOnce(&Self) -> StoreResult<T>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = work(self)?;
        tx.commit()?;
        Ok(value)
    }
}

fn load_task(conn: &Connection, id: TaskId) -> StoreResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE t.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn load_required_task(conn: &Connection, id: TaskId) -> StoreResult<Task> {
    load_task(conn, id)?.ok_or(StoreError::TaskNotFound(id))
}

fn load_project(conn: &Connection, id: ProjectId) -> StoreResult<Option<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name
         FROM projects
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_project_row(row)?));
    }
    Ok(None)
}

fn list_task_ids(conn: &Connection, partition: Partition) -> StoreResult<Vec<TaskId>> {
    let mut stmt = conn.prepare(
        "SELECT id
         FROM tasks
         WHERE project_id IS ?1
         ORDER BY priority ASC, id ASC;",
    )?;
    let mut rows = stmt.query([partition_to_db(partition)])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "tasks.id")?);
    }
    Ok(ids)
}

fn next_priority_in(conn: &Connection, partition: Partition) -> StoreResult<i64> {
    let max: i64 = conn.query_row(
        "SELECT COALESCE(MAX(priority), 0)
         FROM tasks
         WHERE project_id IS ?1;",
        [partition_to_db(partition)],
        |row| row.get(0),
    )?;
    max.checked_add(1).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "no priority left after {max} in partition {partition}"
        ))
    })
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "tasks.id")?;
    let project_id = row
        .get::<_, Option<String>>("project_id")?
        .map(|value| parse_uuid(&value, "tasks.project_id"))
        .transpose()?;

    let priority: i64 = row.get("priority")?;
    if priority < 1 {
        return Err(StoreError::InvalidData(format!(
            "invalid priority `{priority}` in tasks.priority"
        )));
    }

    Ok(Task {
        id,
        name: row.get("name")?,
        partition: Partition::from_project_id(project_id),
        priority,
    })
}

fn parse_project_row(row: &Row<'_>) -> StoreResult<Project> {
    let id_text: String = row.get("id")?;
    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        name: row.get("name")?,
    })
}

fn partition_to_db(partition: Partition) -> Option<String> {
    partition.project_id().map(|id| id.to_string())
}

fn parse_uuid(value: &str, column: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_positive_priority(priority: i64) -> StoreResult<()> {
    if priority < 1 {
        return Err(StoreError::InvalidPriority(priority));
    }
    Ok(())
}

fn map_partition_write_error(err: rusqlite::Error, partition: Partition) -> StoreError {
    match partition {
        Partition::Project(project_id)
            if is_constraint(&err, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) =>
        {
            StoreError::ProjectNotFound(project_id)
        }
        _ => err.into(),
    }
}

fn is_constraint(err: &rusqlite::Error, extended_code: i32) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation && inner.extended_code == extended_code
    )
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED: &[(&str, &[&str])] = &[
        ("projects", &["id", "name"]),
        ("tasks", &["id", "name", "project_id", "priority"]),
    ];
    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
