use rusqlite::Connection;
use tasklane_core::db::open_db_in_memory;
use tasklane_core::{
    next_priority, reorder, OrderingError, Partition, SqliteTaskStore, StoreError, Task, TaskId,
    TaskStore,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn seed(store: &SqliteTaskStore<'_>, partition: Partition, names: &[&str]) -> Vec<Task> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            store
                .create_task(name, partition, index as i64 + 1)
                .unwrap()
        })
        .collect()
}

fn priority_of(store: &SqliteTaskStore<'_>, id: TaskId) -> i64 {
    store.get_task(id).unwrap().unwrap().priority
}

#[test]
fn next_priority_starts_at_one_and_appends() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let project = store.create_project("Inbox").unwrap();
    let inbox = Partition::Project(project.id);

    assert_eq!(next_priority(&store, inbox).unwrap(), 1);
    store.create_task("first", inbox, 1).unwrap();
    assert_eq!(next_priority(&store, inbox).unwrap(), 2);
    assert_eq!(next_priority(&store, Partition::Unassigned).unwrap(), 1);
}

#[test]
fn next_priority_follows_gaps_left_by_deletes() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let tasks = seed(&store, Partition::Unassigned, &["a", "b", "c"]);

    store.delete_task(tasks[1].id).unwrap();
    assert_eq!(next_priority(&store, Partition::Unassigned).unwrap(), 4);

    store.delete_task(tasks[2].id).unwrap();
    assert_eq!(next_priority(&store, Partition::Unassigned).unwrap(), 2);
}

#[test]
fn next_priority_reports_exhausted_priority_space() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    store
        .create_task("last", Partition::Unassigned, i64::MAX)
        .unwrap();

    let err = next_priority(&store, Partition::Unassigned).unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
    assert!(err.to_string().contains("no priority left"));
}

#[test]
fn reorder_counts_repeated_ids_once() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let tasks = seed(&store, Partition::Unassigned, &["a", "b"]);

    let outcome = reorder(
        &store,
        Partition::Unassigned,
        &[tasks[0].id, tasks[1].id, tasks[0].id],
    )
    .unwrap();

    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.applied, 2);
    assert_eq!(priority_of(&store, tasks[0].id), 3);
    assert_eq!(priority_of(&store, tasks[1].id), 2);
}

#[test]
fn reorder_rewrites_priorities_in_given_order() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let project = store.create_project("ProjectA").unwrap();
    let partition = Partition::Project(project.id);
    let tasks = seed(&store, partition, &["T1", "T2", "T3"]);
    let (t1, t2, t3) = (tasks[0].id, tasks[1].id, tasks[2].id);

    let outcome = reorder(&store, partition, &[t3, t1, t2]).unwrap();

    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.applied, 3);
    assert_eq!(priority_of(&store, t3), 1);
    assert_eq!(priority_of(&store, t1), 2);
    assert_eq!(priority_of(&store, t2), 3);
}

#[test]
fn reorder_is_idempotent() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let tasks = seed(&store, Partition::Unassigned, &["a", "b", "c", "d"]);
    let order = vec![tasks[2].id, tasks[0].id, tasks[3].id, tasks[1].id];

    reorder(&store, Partition::Unassigned, &order).unwrap();
    let first = order
        .iter()
        .map(|id| priority_of(&store, *id))
        .collect::<Vec<_>>();
    reorder(&store, Partition::Unassigned, &order).unwrap();
    let second = order
        .iter()
        .map(|id| priority_of(&store, *id))
        .collect::<Vec<_>>();

    assert_eq!(first, vec![1, 2, 3, 4]);
    assert_eq!(first, second);
}

#[test]
fn reorder_skips_ids_from_other_partitions() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let project = store.create_project("Work").unwrap();
    let work = Partition::Project(project.id);
    let loose = seed(&store, Partition::Unassigned, &["u1", "u2"]);
    let foreign = store.create_task("w1", work, 9).unwrap();

    let outcome = reorder(
        &store,
        Partition::Unassigned,
        &[foreign.id, loose[1].id, loose[0].id],
    )
    .unwrap();

    assert_eq!(outcome.applied, 2);
    let foreign = store.get_task(foreign.id).unwrap().unwrap();
    assert_eq!(foreign.partition, work);
    assert_eq!(foreign.priority, 9);
    assert_eq!(priority_of(&store, loose[1].id), 2);
    assert_eq!(priority_of(&store, loose[0].id), 3);
}

#[test]
fn reorder_ignores_unknown_ids() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let tasks = seed(&store, Partition::Unassigned, &["a", "b"]);

    let outcome = reorder(
        &store,
        Partition::Unassigned,
        &[tasks[1].id, Uuid::new_v4(), tasks[0].id],
    )
    .unwrap();

    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.applied, 2);
    assert_eq!(priority_of(&store, tasks[1].id), 1);
    assert_eq!(priority_of(&store, tasks[0].id), 3);
}

#[test]
fn partial_reorder_leaves_omitted_tasks_untouched() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let tasks = seed(&store, Partition::Unassigned, &["a", "b", "c"]);

    reorder(&store, Partition::Unassigned, &[tasks[2].id]).unwrap();

    assert_eq!(priority_of(&store, tasks[2].id), 1);
    assert_eq!(priority_of(&store, tasks[0].id), 1);
    assert_eq!(priority_of(&store, tasks[1].id), 2);
}

#[test]
fn reorder_with_empty_sequence_changes_nothing() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let tasks = seed(&store, Partition::Unassigned, &["a", "b"]);

    let outcome = reorder(&store, Partition::Unassigned, &[]).unwrap();

    assert_eq!(outcome.applied, 0);
    assert_eq!(priority_of(&store, tasks[0].id), 1);
    assert_eq!(priority_of(&store, tasks[1].id), 2);
}

#[test]
fn failed_reorder_rolls_back_every_update() {
    let conn = setup();
    let store = SqliteTaskStore::try_new(&conn).unwrap();
    let project = store.create_project("ProjectA").unwrap();
    let partition = Partition::Project(project.id);
    let tasks = seed(&store, partition, &["T1", "T2", "T3"]);

    conn.execute_batch(&format!(
        "CREATE TRIGGER fail_priority_update
         BEFORE UPDATE OF priority ON tasks
         WHEN NEW.id = '{}'
         BEGIN
             SELECT RAISE(ABORT, 'injected store fault');
         END;",
        tasks[0].id
    ))
    .unwrap();

    let err = reorder(&store, partition, &[tasks[2].id, tasks[1].id, tasks[0].id]).unwrap_err();
    match err {
        OrderingError::Transaction {
            partition: failed, ..
        } => assert_eq!(failed, partition),
    }

    assert_eq!(priority_of(&store, tasks[0].id), 1);
    assert_eq!(priority_of(&store, tasks[1].id), 2);
    assert_eq!(priority_of(&store, tasks[2].id), 3);

    conn.execute_batch("DROP TRIGGER fail_priority_update;")
        .unwrap();
    reorder(&store, partition, &[tasks[2].id, tasks[1].id, tasks[0].id]).unwrap();
    assert_eq!(priority_of(&store, tasks[0].id), 3);
}
