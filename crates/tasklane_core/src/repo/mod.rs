//! Store layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow data access contract used by the ordering engine.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Store APIs return semantic errors (`TaskNotFound`, `ProjectNotFound`,
//!   `DuplicateProjectName`) in addition to DB transport errors.

pub mod task_store;
