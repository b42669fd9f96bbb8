//! Core use-case services.
//!
//! # Responsibility
//! - Derive priorities, rewrite partition order and group tasks for display.
//! - Orchestrate store calls into user-facing task manager operations.
//! - Keep UI/CLI layers decoupled from storage details.

pub mod grouping;
pub mod notify;
pub mod ordering;
pub mod priority;
pub mod task_manager;
