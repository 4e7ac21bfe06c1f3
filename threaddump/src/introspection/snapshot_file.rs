//! Snapshots published as JSON by the runtime's capture agent
//!
//! The agent inside the target runtime suspends the process, serializes heap
//! and thread state to `<snapshot-dir>/<pid>.json`, and resumes once the file
//! is written. A saved file can also be dumped directly, long after the
//! process is gone.

use super::{IntrospectionProvider, ManagedObject, RuntimeSnapshot, SnapshotHandle, Target};
use crate::domain::{FieldError, Pid, RuntimeInfo, RuntimeThread, SnapshotError};
use crate::preflight::probe_process;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where the capture agent publishes snapshots unless told otherwise
pub const DEFAULT_SNAPSHOT_DIR: &str = "/tmp/threaddump";

/// Provider backed by snapshot files
pub struct SnapshotFileProvider {
    snapshot_dir: PathBuf,
}

impl SnapshotFileProvider {
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self { snapshot_dir: snapshot_dir.into() }
    }

    /// Path the capture agent uses for `pid`
    #[must_use]
    pub fn snapshot_path(&self, pid: Pid) -> PathBuf {
        self.snapshot_dir.join(format!("{}.json", pid.0))
    }

    fn acquire_live(&self, pid: Pid) -> Result<FileSnapshot, SnapshotError> {
        probe_process(pid)?;

        let path = self.snapshot_path(pid);
        info!("Reading snapshot of {pid} from {}", path.display());

        let snapshot = FileSnapshot::load(&path).map_err(|err| match err {
            SnapshotError::SnapshotUnavailable { source, .. }
                if source.kind() == io::ErrorKind::NotFound =>
            {
                SnapshotError::RuntimeNotDetected(pid)
            }
            SnapshotError::SnapshotUnavailable { source, .. }
                if source.kind() == io::ErrorKind::PermissionDenied =>
            {
                SnapshotError::AccessDenied(pid)
            }
            SnapshotError::NoRuntimeInSnapshot { .. } => SnapshotError::RuntimeNotDetected(pid),
            other => other,
        })?;

        if let Some(recorded) = snapshot.pid() {
            if recorded != pid {
                warn!("Snapshot {} was recorded for {recorded}, not {pid}", path.display());
            }
        }

        Ok(snapshot)
    }
}

impl Default for SnapshotFileProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_DIR)
    }
}

impl IntrospectionProvider for SnapshotFileProvider {
    fn acquire(&self, target: &Target) -> Result<SnapshotHandle, SnapshotError> {
        let snapshot = match target {
            Target::Pid(pid) => self.acquire_live(*pid)?,
            Target::SnapshotFile(path) => FileSnapshot::load(path)?,
        };
        debug!(
            "Acquired snapshot {} ({}, {} heap objects, {} threads)",
            snapshot.source.display(),
            snapshot.runtime,
            snapshot.heap.len(),
            snapshot.threads.len()
        );
        Ok(Rc::new(snapshot))
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    pid: Option<Pid>,
    #[serde(default)]
    runtimes: Vec<RuntimeInfo>,
    #[serde(default)]
    heap: Vec<HeapObject>,
    #[serde(default)]
    threads: Vec<RuntimeThread>,
}

/// A field value as serialized by the capture agent; `null` is a null reference
///
/// Only ints and strings are ever read. Anything else (bools, floats, nested
/// structs) is kept opaque so that one odd field can't reject the snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Int(i64),
    Str(String),
    Other(serde_json::Value),
}

/// Heap object record of a snapshot file
#[derive(Debug, Deserialize)]
pub struct HeapObject {
    address: u64,
    /// Missing when the agent could not resolve the method table
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(default)]
    fields: HashMap<String, Option<FieldValue>>,
}

impl HeapObject {
    fn field(&self, name: &str) -> Result<Option<&FieldValue>, FieldError> {
        self.fields
            .get(name)
            .map(Option::as_ref)
            .ok_or_else(|| FieldError::Missing(name.to_string()))
    }
}

impl ManagedObject for HeapObject {
    fn address(&self) -> u64 {
        self.address
    }

    fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn read_int_field(&self, name: &str) -> Result<i32, FieldError> {
        let mismatch = || FieldError::TypeMismatch { field: name.to_string(), expected: "int" };
        match self.field(name)? {
            Some(FieldValue::Int(value)) => i32::try_from(*value).map_err(|_| mismatch()),
            _ => Err(mismatch()),
        }
    }

    fn read_string_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        match self.field(name)? {
            Some(FieldValue::Str(value)) => Ok(Some(value.clone())),
            None => Ok(None),
            Some(FieldValue::Int(_) | FieldValue::Other(_)) => {
                Err(FieldError::TypeMismatch { field: name.to_string(), expected: "string" })
            }
        }
    }
}

/// A snapshot loaded from disk
#[derive(Debug)]
pub struct FileSnapshot {
    source: PathBuf,
    pid: Option<Pid>,
    runtime: RuntimeInfo,
    heap: Vec<HeapObject>,
    threads: Vec<RuntimeThread>,
}

impl FileSnapshot {
    /// Load a snapshot file
    ///
    /// # Errors
    /// Returns an error if the file can't be read, isn't a valid snapshot,
    /// or lists no managed runtime
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path).map_err(|source| SnapshotError::SnapshotUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parse a snapshot from any reader; `source` is only used for messages
    ///
    /// # Errors
    /// Returns an error if the data isn't a valid snapshot or lists no runtime
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self, SnapshotError> {
        let doc: SnapshotDocument = serde_json::from_reader(reader)
            .map_err(|source_err| SnapshotError::Malformed {
                path: source.to_path_buf(),
                source: source_err,
            })?;

        let Some(runtime) = doc.runtimes.into_iter().next() else {
            return Err(SnapshotError::NoRuntimeInSnapshot { path: source.to_path_buf() });
        };

        Ok(Self {
            source: source.to_path_buf(),
            pid: doc.pid,
            runtime,
            heap: doc.heap,
            threads: doc.threads,
        })
    }

    #[must_use]
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }
}

impl RuntimeSnapshot for FileSnapshot {
    fn runtime(&self) -> &RuntimeInfo {
        &self.runtime
    }

    fn heap_objects(&self) -> Box<dyn Iterator<Item = &dyn ManagedObject> + '_> {
        Box::new(self.heap.iter().map(|obj| obj as &dyn ManagedObject))
    }

    fn threads(&self) -> Box<dyn Iterator<Item = &RuntimeThread> + '_> {
        Box::new(self.threads.iter())
    }
}

impl Drop for FileSnapshot {
    fn drop(&mut self) {
        debug!("Released snapshot {}", self.source.display());
    }
}
