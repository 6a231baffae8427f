//! Shared model definitions for Taskboard tasks and projects.

pub mod project;
pub mod task;
