//! # Runtime Introspection
//!
//! Interface boundary to whatever freezes the target process and exposes its
//! runtime state. The rest of the crate only sees these traits:
//!
//! ```text
//! IntrospectionProvider::acquire(target)
//!          │
//!          ▼
//!   SnapshotHandle (Rc<dyn RuntimeSnapshot>)
//!          │
//!          ├── heap_objects()  ──▶ ThreadNameIndex
//!          └── threads()       ──▶ ReportAssembler ──▶ FrameSymbolicator
//! ```
//!
//! A snapshot is immutable once acquired. Every reader shares the same handle,
//! and dropping the last clone releases the target (resumes/detaches).
//!
//! The crate ships [`SnapshotFileProvider`], which reads snapshots published
//! by the runtime's capture agent as JSON.

pub mod snapshot_file;

pub use snapshot_file::{FileSnapshot, SnapshotFileProvider};

use crate::domain::{FieldError, Pid, RuntimeInfo, RuntimeThread, SnapshotError};
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Shared handle to one frozen snapshot
pub type SnapshotHandle = Rc<dyn RuntimeSnapshot>;

/// What to take a snapshot of
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A live process
    Pid(Pid),
    /// A snapshot captured earlier and saved to disk
    SnapshotFile(PathBuf),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Pid(pid) => write!(f, "{}", pid.0),
            Target::SnapshotFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Creates snapshots of target processes
pub trait IntrospectionProvider {
    /// Freeze `target` and return a read-only view of its runtime state.
    ///
    /// This is the only blocking step of a dump and cannot be cancelled.
    ///
    /// # Errors
    /// Any failure here is fatal for the dump: the process is missing, cannot
    /// be accessed, or has no managed runtime.
    fn acquire(&self, target: &Target) -> Result<SnapshotHandle, SnapshotError>;
}

/// Read-only view of a frozen process
pub trait RuntimeSnapshot {
    /// The runtime being inspected (the first one found in the process)
    fn runtime(&self) -> &RuntimeInfo;

    /// Every object on the managed heap, in heap order
    fn heap_objects(&self) -> Box<dyn Iterator<Item = &dyn ManagedObject> + '_>;

    /// Runtime threads in the runtime's own order, each with its walked stack
    fn threads(&self) -> Box<dyn Iterator<Item = &RuntimeThread> + '_>;
}

/// Transient handle to an object on the managed heap
pub trait ManagedObject {
    fn address(&self) -> u64;

    /// Fully qualified type name, `None` when the type metadata can't be resolved
    fn type_name(&self) -> Option<&str>;

    /// Read a 32-bit integer instance field
    ///
    /// # Errors
    /// Returns an error if the field is missing or not an integer
    fn read_int_field(&self, name: &str) -> Result<i32, FieldError>;

    /// Read a string instance field; a null reference reads as `None`
    ///
    /// # Errors
    /// Returns an error if the field is missing or not a string
    fn read_string_field(&self, name: &str) -> Result<Option<String>, FieldError>;
}
