//! Line-oriented shell over the budget manager command surface.

mod commands;
pub mod output;
mod shell;
mod shell_context;

use thiserror::Error;

use crate::errors::BudgetError;

pub use shell::run_cli;
pub use shell_context::ShellContext;

/// Failures that end the shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Budget(#[from] BudgetError),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures of a single shell command; reported and then the loop continues.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] BudgetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}
