//! Thread name recovery from the managed heap
//!
//! Runtime thread records carry no name. The name lives on the managed
//! `System.Threading.Thread` object, so the whole heap is scanned for those
//! objects and their id/name fields are collected.

use log::debug;
use std::collections::HashMap;

use crate::domain::ManagedThreadId;
use crate::introspection::{ManagedObject, RuntimeSnapshot};

/// Type name of the runtime's managed thread object
pub const THREAD_TYPE_NAME: &str = "System.Threading.Thread";

/// Field names on the managed thread object
const MANAGED_THREAD_ID_FIELD: &str = "_managedThreadId";
const NAME_FIELD: &str = "_name";

/// Shown for threads without a recovered name
pub const UNKNOWN_THREAD_NAME: &str = "Unknown";

/// Managed thread id → thread name, built once per snapshot
#[derive(Debug, Default)]
pub struct ThreadNameIndex {
    names: HashMap<ManagedThreadId, Option<String>>,
}

impl ThreadNameIndex {
    /// Scan every heap object of `snapshot`
    pub fn build(snapshot: &dyn RuntimeSnapshot) -> Self {
        Self::from_objects(snapshot.heap_objects())
    }

    /// Build the index from a stream of heap objects
    ///
    /// Objects with unresolved types or unreadable fields are skipped. A
    /// later object with the same id overwrites an earlier one.
    pub fn from_objects<'a>(objects: impl IntoIterator<Item = &'a dyn ManagedObject>) -> Self {
        let mut names = HashMap::new();
        let mut skipped = 0usize;

        for obj in objects {
            let Some(type_name) = obj.type_name() else {
                skipped += 1;
                continue;
            };
            if type_name != THREAD_TYPE_NAME {
                continue;
            }

            let id = match obj.read_int_field(MANAGED_THREAD_ID_FIELD) {
                Ok(id) => ManagedThreadId(id),
                Err(e) => {
                    debug!("Skipping thread object at 0x{:x}: {e}", obj.address());
                    continue;
                }
            };
            let name = match obj.read_string_field(NAME_FIELD) {
                Ok(name) => name,
                Err(e) => {
                    debug!("Skipping thread object at 0x{:x}: {e}", obj.address());
                    continue;
                }
            };

            names.insert(id, name);
        }

        if skipped > 0 {
            debug!("Skipped {skipped} heap objects with unresolved types");
        }
        debug!("Recovered {} managed thread objects", names.len());

        Self { names }
    }

    /// The thread's name, if its object was found and the name is set
    #[must_use]
    pub fn name(&self, id: ManagedThreadId) -> Option<&str> {
        self.names.get(&id).and_then(Option::as_deref)
    }

    /// The name to print for a thread
    #[must_use]
    pub fn display_name(&self, id: ManagedThreadId) -> &str {
        self.name(id).unwrap_or(UNKNOWN_THREAD_NAME)
    }
}
