use std::fmt;

use thiserror::Error;

use crate::{spec::ValueType, value::Value};

/// A mistake in how a command is declared.
///
/// These surface from [`Command::build`](crate::Command::build) and
/// [`configure`](crate::configure), before any input is looked at, and
/// mean the program itself needs fixing.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("flag definition is empty")]
    EmptyFlag,

    #[error("invalid definition `{def}`: {reason}")]
    Malformed { def: String, reason: String },

    #[error("option `{0}` is declared twice")]
    DuplicateName(String),

    #[error("alias `{alias}` of `{option}` is already taken by `{other}`")]
    AliasCollision { alias: String, option: String, other: String },

    #[error("default of `{name}` does not match its type ({value_type}): {default:?}")]
    DefaultType { name: String, value_type: ValueType, default: Value },

    #[error("command `{parent}` declares `{name}` twice")]
    DuplicateCommand { parent: String, name: String },

    #[error("command `{0}` has neither an action nor subcommands")]
    MissingAction(String),

    #[error("settings are already in use and can't be configured again")]
    AlreadyConfigured,
}

/// A user-input or action failure while running a command.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid command `{command}`.{}", did_you_mean(.suggestion))]
    InvalidCommand { command: String, suggestion: Option<String> },

    #[error("Missing required parameter `{0}`. Use `--help` for more information")]
    MissingParameter(String),

    #[error("Missing required flag `--{0}`. Use `--help` for more information")]
    MissingFlag(String),

    #[error(transparent)]
    Action(anyhow::Error),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(it) => format!(" Did you mean `{it}`? Use `--help` for more information"),
        None => " Use `--help` for more information".to_string(),
    }
}

impl Error {
    /// Whether the error comes from bad input rather than from an action.
    pub fn is_usage(&self) -> bool {
        !matches!(self, Error::Action(_))
    }

    pub fn exit(self) -> ! {
        if self.is_usage() {
            eprintln!("error: {self}");
            std::process::exit(2)
        }
        eprintln!("error: {self:#}");
        std::process::exit(1)
    }
}

/// A flag the active command does not declare.
///
/// Reported through [`Outcome::Aborted`](crate::Outcome::Aborted) when the
/// unknown-flag hook stops the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFlag {
    pub flag: String,
    /// Full command path, `pm install`.
    pub command: String,
}

impl fmt::Display for UnknownFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid argument `{}` for `{}`. Use `--help` for more information",
            self.flag, self.command
        )
    }
}
