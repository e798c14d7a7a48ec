//! Error handling for the waffle application.
//! Defines the error type and result alias used throughout the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::command::CommandId;

/// Custom error types for waffle operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong or missing command arguments.
    #[error("Invalid command usage: {0}")]
    Usage(String),

    /// An error tagged with the command node it originated at.
    #[error("Command {command} failed: {source}")]
    Command {
        command: String,
        node: CommandId,
        #[source]
        source: Box<Error>,
    },

    /// A template resource failed to load or parse.
    #[error("Failed to load template '{name}': {source}")]
    TemplateParseError {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// A template failed while executing against the configuration value.
    #[error("Failed to execute template '{name}': {source}")]
    TemplateRenderError {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// The template root could not be listed or read.
    #[error("Failed to read template root '{path}': {reason}")]
    TemplateRootError { path: String, reason: String },

    /// One or more rendered source files could not be reformatted.
    /// The unformatted contents were still written.
    #[error("Failed to format {}", format_failures(.0))]
    FormatError(Vec<FormatFailure>),

    /// A source formatter could not be run or rejected its input.
    #[error("Formatter error: {0}")]
    FormatterError(String),

    #[error("Failed to create directory '{}': {source}", .path.display())]
    CreateDirError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{}': {source}", .path.display())]
    WriteFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid version {0:?}: expected <major>.<minor>.<patch>")]
    VersionError(String),

    #[error("Git repo does not exist")]
    NoGitRepo,

    #[error("Git repo does not have any semantic version tags")]
    NoGitVersion,

    #[error("Remote 'origin' already exists")]
    OriginExists,

    #[error("Git error: {0}")]
    Git2Error(#[from] git2::Error),

    #[error("Prompt error: {0}")]
    PromptError(String),
}

/// A single source file whose formatting pass failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatFailure {
    pub path: PathBuf,
    pub reason: String,
}

fn format_failures(failures: &[FormatFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("'{}': {}", f.path.display(), f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Reports whether this error, or the error it tags, is a usage error.
    pub fn is_usage(&self) -> bool {
        match self {
            Error::Usage(_) => true,
            Error::Command { source, .. } => source.is_usage(),
            _ => false,
        }
    }

    /// The node this error was tagged with, if any.
    pub fn node(&self) -> Option<CommandId> {
        match self {
            Error::Command { node, .. } => Some(*node),
            _ => None,
        }
    }

    /// The untagged cause.
    pub fn cause(&self) -> &Error {
        match self {
            Error::Command { source, .. } => source.cause(),
            err => err,
        }
    }
}

/// Convenience type alias for Results with waffle's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;
