//! `Taskboard`: terminal project board with optimistic task reconciliation.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod drag;
pub mod projector;
pub mod remote;
pub mod store;
pub mod ui;
pub mod worker;
