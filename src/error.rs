//! Typed error kinds shared across the crate (spec §13).
//!
//! `Display` renders just the `<message>` half of the diagnostic format in
//! spec §7 — the `<program>: ` prefix is applied once, at the boundary,
//! via [`crate::diagnostics`].

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}: {1}")]
    Io(String, #[source] io::Error),

    #[error("{0}: command not found")]
    NotFound(String),

    #[error("{0}")]
    PermissionOrType(String),

    #[error("{0}")]
    BuiltinUsage(String),

    #[error("{0}")]
    JobRef(String),

    #[error("{0}")]
    TableFull(String),
}

impl From<io::Error> for ShellError {
    fn from(err: io::Error) -> Self {
        ShellError::Io(err.to_string(), err)
    }
}

impl ShellError {
    /// The exit code a bare parent-side failure of this kind should produce
    /// when it aborts a pipeline outright (spec §7 "internal shell error").
    pub fn exit_code(&self) -> i32 {
        match self {
            ShellError::NotFound(_) => 127,
            _ => 1,
        }
    }
}
