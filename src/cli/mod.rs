//! Command-line interface for redqueue.
//!
//! Provides commands for pushing, popping, inspecting and clearing a queue.

mod commands;

pub use commands::{execute, parse_cli, run, run_with_cli, Cli, Commands};
