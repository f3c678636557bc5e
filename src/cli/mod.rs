//! CLI module for the `shoprank` binary
//!
//! Argument parsing, command handlers and terminal output.

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::*;
pub use handlers::*;
pub use output::*;
