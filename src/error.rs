use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for ripkit operations
#[derive(Error, Diagnostic, Debug)]
pub enum RipkitError {
    #[error("IO error: {0}")]
    #[diagnostic(code(ripkit::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(ripkit::io))]
    Io { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(ripkit::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{tool} is not installed")]
    #[diagnostic(code(ripkit::tool_not_found))]
    ToolNotFound {
        tool: String,
        #[help]
        help: Option<String>,
    },

    #[error("{tool} failed: {message}")]
    #[diagnostic(code(ripkit::subprocess))]
    Subprocess { tool: String, message: String },

    #[error("Entity file error: {message}")]
    #[diagnostic(code(ripkit::format))]
    Format {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Write error with {path}: {message}")]
    #[diagnostic(code(ripkit::write))]
    Write { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, RipkitError>;
