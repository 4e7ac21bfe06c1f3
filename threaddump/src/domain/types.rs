//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep the different thread identifiers apart: a
//! managed thread id is assigned by the runtime, an OS thread id by the
//! kernel, and the report prints both side by side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<i32> for Pid {
    fn from(pid: i32) -> Self {
        Pid(pid)
    }
}

/// Managed thread ID
///
/// The runtime's own identifier for a logical thread. This is the key shared
/// by the runtime thread record and the thread object on the managed heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedThreadId(pub i32);

impl fmt::Display for ManagedThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OS thread ID (0 when the runtime thread has no OS thread attached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsThreadId(pub u32);

impl fmt::Display for OsThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata token identifying a compiled method inside its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodToken(pub u32);

impl fmt::Display for MethodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// A single flag of a runtime thread's execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadStateFlag {
    Background,
    Unstarted,
    Stopped,
    WaitSleepJoin,
    Suspended,
    SuspendRequested,
    AbortRequested,
    Aborted,
    Finalizer,
    ThreadPoolWorker,
    Gc,
}

impl fmt::Display for ThreadStateFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Background => "Background",
            Self::Unstarted => "Unstarted",
            Self::Stopped => "Stopped",
            Self::WaitSleepJoin => "WaitSleepJoin",
            Self::Suspended => "Suspended",
            Self::SuspendRequested => "SuspendRequested",
            Self::AbortRequested => "AbortRequested",
            Self::Aborted => "Aborted",
            Self::Finalizer => "Finalizer",
            Self::ThreadPoolWorker => "ThreadPoolWorker",
            Self::Gc => "GC",
        };
        f.write_str(s)
    }
}

/// Execution state of a runtime thread, a set of flags
///
/// An empty set means the thread is plainly running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadState(pub Vec<ThreadStateFlag>);

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("Running");
        }
        for (idx, flag) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{flag}")?;
        }
        Ok(())
    }
}

/// Exception currently in flight on a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub type_name: String,
    pub message: String,
}

/// One entry of a method's native-to-IL offset table
///
/// `il_offset` is negative for prolog/epilog and unmapped regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ILOffsetMapping {
    pub start_address: u64,
    pub end_address: u64,
    pub il_offset: i32,
}

/// Identity of a managed method as seen from a stack frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Display form of the method, e.g. `App.Worker.Run(System.Int32)`
    pub signature: String,
    pub token: MethodToken,
    /// Debug-info path recorded in the method's module, if it has one
    #[serde(default)]
    pub module_pdb_path: Option<String>,
    /// Sorted ascending by `start_address`
    #[serde(default)]
    pub il_offset_map: Vec<ILOffsetMapping>,
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature)
    }
}

/// A stack frame; no method means a runtime-internal frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub instruction_pointer: u64,
    #[serde(default)]
    pub method: Option<MethodInfo>,
}

/// The runtime's record of a logical thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeThread {
    pub managed_thread_id: ManagedThreadId,
    pub os_thread_id: OsThreadId,
    pub is_alive: bool,
    #[serde(default)]
    pub state: ThreadState,
    #[serde(default)]
    pub current_exception: Option<ExceptionInfo>,
    /// Stack-walk order, outermost active call first, as the provider yields it
    #[serde(default)]
    pub frames: Vec<StackFrame>,
}

/// Source file and 1-based line number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Which runtime a snapshot was taken from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub flavor: String,
    pub version: String,
}

impl fmt::Display for RuntimeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flavor, self.version)
    }
}
