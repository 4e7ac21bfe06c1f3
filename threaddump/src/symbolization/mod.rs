//! # Frame Symbolication
//!
//! Turns a managed stack frame into `method at file:line` when the matching
//! debug info is loaded.
//!
//! ## Resolution Flow
//!
//! ```text
//! 1. Frame has no method identity
//!      → "[internal]"
//!
//! 2. Debug-info module loaded AND frame's module debug path == module path
//!    (exact string comparison, no normalization)
//!      otherwise → plain method display
//!
//! 3. Pick the IL offset from the method's native→IL offset table, ordered
//!    by start address: the LAST entry whose start address <= instruction pointer
//!      start=0x00 → IL 0x00
//!      start=0x10 → IL 0x04   ◀── ip = 0x1c selects this entry
//!      start=0x20 → IL 0x09
//!    no entry / negative IL offset (prolog, epilog) → plain display
//!
//! 4. Ask the module for (method token, IL offset) → source location
//!    none or lookup error → plain display (error is logged, never raised)
//! ```
//!
//! Only the end bound of the selected range is left unchecked: an instruction
//! pointer past the real end of the last range still maps to that range.
//!
//! ## Module Structure
//!
//! - **`symbolicator`**: the per-frame resolution rules above
//! - **`symbol_map`**: a JSON sequence-point map, the debug-info format
//!   this crate can load

pub mod symbol_map;
pub mod symbolicator;

pub use symbol_map::{SequencePoint, SequencePointMap, SequencePointProvider, HIDDEN_LINE};
pub use symbolicator::{select_il_offset, FrameSymbolicator, Resolution, SymbolicatedFrame, Unresolved};

use crate::domain::{MethodToken, SourceLocation, SymbolError};
use std::path::Path;
use std::rc::Rc;

/// Loaded debug info for one compiled module
pub trait DebugInfoModule {
    /// Canonical path the module was loaded from
    fn path(&self) -> &str;

    /// Source location of an IL offset inside a method
    ///
    /// `Ok(None)` when the method or offset has no source mapping.
    ///
    /// # Errors
    /// Returns an error if the symbol data for the method can't be read
    fn source_location(
        &self,
        token: MethodToken,
        il_offset: u32,
    ) -> Result<Option<SourceLocation>, SymbolError>;
}

/// Loads debug-info modules from files
pub trait SymbolProvider {
    /// # Errors
    /// Returns an error if the file can't be read or parsed
    fn open(&self, path: &Path) -> Result<Rc<dyn DebugInfoModule>, SymbolError>;
}
