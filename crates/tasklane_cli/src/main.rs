//! `tasklane` command line entry point.
//!
//! # Responsibility
//! - Map subcommands onto one task manager operation each.
//! - Print the operation's notification and the reloaded board.

mod cli;

use clap::Parser;
use cli::{Cli, Command, PartitionArgs, ProjectCommand};
use log::info;
use std::process::ExitCode;
use tasklane_core::db::open_db;
use tasklane_core::{
    default_log_level, init_logging, Board, CollectingNotifier, LogConfig, ManagerError,
    ManagerResult, Notification, Partition, Session, SqliteTaskStore, TaskFilter, TaskManager,
    TaskStore,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(&LogConfig::new(level, log_dir)) {
            eprintln!("tasklane: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tasklane: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(&cli.db)?;
    let store = SqliteTaskStore::try_new(&conn)?;
    let notifier = CollectingNotifier::new();
    let manager = TaskManager::new(store, &notifier);
    let mut session = Session::default();

    info!(
        "event=cli_command module=cli status=start command={:?}",
        cli.command
    );
    let result = execute(&manager, &mut session, &cli.command);

    for notification in notifier.drain() {
        print_notification(&notification);
    }
    result?;

    if let Command::Project(ProjectCommand::List) = cli.command {
        print_projects(&session.board, cli.json)?;
    } else {
        print_board(&session.board, cli.json)?;
    }
    Ok(())
}

fn execute(
    manager: &TaskManager<SqliteTaskStore<'_>, &CollectingNotifier>,
    session: &mut Session,
    command: &Command,
) -> ManagerResult<()> {
    match command {
        Command::Project(ProjectCommand::Add { name }) => {
            manager.create_project(session, name)?;
        }
        Command::Project(ProjectCommand::List) => {
            manager.load_board(session)?;
        }
        Command::Project(ProjectCommand::Delete { id }) => {
            manager.delete_project(session, *id)?;
        }
        Command::Add { name, target } => {
            session.selected_partition = partition_of(target);
            manager.create_task(session, name)?;
        }
        Command::List { target } => {
            let filter = if target.project.is_some() || target.unassigned {
                TaskFilter::Partition(partition_of(target))
            } else {
                TaskFilter::All
            };
            manager.filter_by(session, filter)?;
        }
        Command::Rename { id, name } => {
            manager.start_editing(session, *id)?;
            manager.update_task(session, name)?;
        }
        Command::Delete { id } => {
            manager.delete_task(session, *id)?;
        }
        Command::Move { id, target } => {
            manager.move_task(session, *id, partition_of(target))?;
        }
        Command::Reorder { target, ids } => {
            let partition = partition_of(target);
            ensure_known_partition(manager, partition)?;
            session.filter = TaskFilter::Partition(partition);
            manager.update_task_order(session, partition, ids)?;
        }
    }
    Ok(())
}

fn partition_of(target: &PartitionArgs) -> Partition {
    Partition::from_project_id(target.project)
}

fn ensure_known_partition(
    manager: &TaskManager<SqliteTaskStore<'_>, &CollectingNotifier>,
    partition: Partition,
) -> ManagerResult<()> {
    if let Partition::Project(id) = partition {
        if manager.store().get_project(id)?.is_none() {
            return Err(ManagerError::ProjectNotFound(id));
        }
    }
    Ok(())
}

fn print_notification(notification: &Notification) {
    if notification.is_success() {
        eprintln!("ok: {}", notification.message);
    } else {
        eprintln!("error: {}", notification.message);
    }
}

fn print_projects(board: &Board, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(&board.projects)?);
        return Ok(());
    }
    for project in &board.projects {
        println!("{}  {}", project.id, project.name);
    }
    Ok(())
}

fn print_board(board: &Board, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(board)?);
        return Ok(());
    }
    if board.groups.iter().all(|group| group.tasks.is_empty()) {
        println!("(no tasks)");
        return Ok(());
    }
    for group in &board.groups {
        match group.partition.project_id() {
            Some(id) => println!("== {} ({id})", group.label),
            None => println!("== {}", group.label),
        }
        for task in &group.tasks {
            println!("{:>4}. {}  {}", task.priority, task.name, task.id);
        }
    }
    Ok(())
}
