// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs the shell commands defined for tasks in a workflow definition, using
//! `tokio::process::Command`, and reports back to the workflow through each
//! launch's [`Completion`](crate::engine::Completion).

pub mod command;

pub use command::ShellHandler;
