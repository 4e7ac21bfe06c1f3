//! Domain model for threaddump
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{
    ExceptionInfo, ILOffsetMapping, ManagedThreadId, MethodInfo, MethodToken, OsThreadId, Pid,
    RuntimeInfo, RuntimeThread, SourceLocation, StackFrame, ThreadState, ThreadStateFlag,
};

pub use errors::{FieldError, SnapshotError, SymbolError};
