//! Domain model for projects, tasks and their partitions.
//!
//! # Responsibility
//! - Define canonical data structures used by the ordering engine.
//! - Own name validation shared by tasks and projects.
//!
//! # Invariants
//! - Every task belongs to exactly one `Partition`.
//! - Names are trimmed, non-empty and at most `MAX_NAME_CHARS` characters.

pub mod project;
pub mod task;
