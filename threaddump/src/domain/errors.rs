//! Structured error types for threaddump
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! `SnapshotError` is always fatal. `FieldError` and the lookup variants of
//! `SymbolError` are absorbed per object / per frame.

use super::types::{MethodToken, Pid};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Process {0} not found")]
    ProcessNotFound(Pid),

    #[error("Permission denied: cannot attach to process {0}")]
    AccessDenied(Pid),

    #[error("No managed runtime detected in process {0}")]
    RuntimeNotDetected(Pid),

    #[error("Snapshot {} does not list any managed runtime", path.display())]
    NoRuntimeInSnapshot { path: PathBuf },

    #[error("Snapshot unavailable at {}: {source}", path.display())]
    SnapshotUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Failed to open symbol file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse symbol file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sequence point of method {token} references missing document #{index}")]
    MissingDocument { token: MethodToken, index: usize },

    #[error("Corrupt symbol data: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Field {0} not found")]
    Missing(String),

    #[error("Field {field} is not of type {expected}")]
    TypeMismatch { field: String, expected: &'static str },
}
