//! Per-frame symbolication with local fallback
//!
//! A frame that can't be symbolicated is never an error: it falls back to
//! plain method display and the reason is logged.

use super::DebugInfoModule;
use crate::domain::{ILOffsetMapping, MethodInfo, SourceLocation, StackFrame};
use log::{info, warn};
use std::fmt;
use std::rc::Rc;

/// Outcome of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(SourceLocation),
    Unresolved(Unresolved),
}

/// Why a frame kept its plain display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No debug-info module was loaded
    NoSymbols,
    /// The frame's module records no debug-info path
    NoDebugInfo,
    /// The frame belongs to a different module than the loaded one
    ModuleMismatch,
    /// No offset range starts at or before the instruction pointer
    NoOffsetMatch,
    /// The matched range has no IL mapping (prolog, epilog, unmapped code)
    NegativeOffset(i32),
    /// The module has no source line for the offset
    NoSourceLocation,
    /// The module failed to read its symbol data
    LookupFailed(String),
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSymbols => f.write_str("no symbols loaded"),
            Self::NoDebugInfo => f.write_str("module has no debug info"),
            Self::ModuleMismatch => f.write_str("different debug-info module"),
            Self::NoOffsetMatch => f.write_str("no IL offset"),
            Self::NegativeOffset(offset) => write!(f, "unmapped IL offset {offset}"),
            Self::NoSourceLocation => f.write_str("no source location"),
            Self::LookupFailed(err) => write!(f, "lookup failed: {err}"),
        }
    }
}

/// A frame ready for the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicatedFrame {
    /// Frame without a managed method (runtime stubs, transitions)
    Internal,
    Method { method: String, location: Option<SourceLocation> },
}

impl fmt::Display for SymbolicatedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => f.write_str("[internal]"),
            Self::Method { method, location: Some(loc) } => write!(f, "{method} at {loc}"),
            Self::Method { method, location: None } => f.write_str(method),
        }
    }
}

/// Pick the IL offset for an instruction pointer
///
/// Orders the table by start address, then keeps the last entry whose start
/// is at or before `ip`. The end address is not checked.
#[must_use]
pub fn select_il_offset(map: &[ILOffsetMapping], ip: u64) -> Option<i32> {
    let mut sorted = map.to_vec();
    sorted.sort_by_key(|m| m.start_address);

    let mut selected = None;
    for entry in &sorted {
        if entry.start_address <= ip {
            selected = Some(entry.il_offset);
        }
    }
    selected
}

/// Resolves frames against an optional debug-info module
pub struct FrameSymbolicator {
    module: Option<Rc<dyn DebugInfoModule>>,
    /// Trace path matching to the log; never changes the output
    pdb_debug: bool,
}

impl FrameSymbolicator {
    pub fn new(module: Option<Rc<dyn DebugInfoModule>>, pdb_debug: bool) -> Self {
        Self { module, pdb_debug }
    }

    /// Symbolicator that never resolves anything
    #[must_use]
    pub fn without_symbols() -> Self {
        Self::new(None, false)
    }

    /// Symbolicate one frame
    pub fn symbolicate(&self, frame: &StackFrame) -> SymbolicatedFrame {
        let Some(ref method) = frame.method else {
            return SymbolicatedFrame::Internal;
        };

        let location = match self.resolve(method, frame.instruction_pointer) {
            Resolution::Resolved(loc) => Some(loc),
            Resolution::Unresolved(_) => None,
        };

        SymbolicatedFrame::Method { method: method.signature.clone(), location }
    }

    /// Try to find the source location of `ip` inside `method`
    pub fn resolve(&self, method: &MethodInfo, ip: u64) -> Resolution {
        let Some(module) = self.module.as_deref() else {
            return Resolution::Unresolved(Unresolved::NoSymbols);
        };
        let Some(pdb_path) = method.module_pdb_path.as_deref() else {
            return Resolution::Unresolved(Unresolved::NoDebugInfo);
        };

        if self.pdb_debug {
            info!("PDB path: {pdb_path}");
            info!("needs to match: {}", module.path());
        }

        // Only read source info from the module the symbols were built for
        if pdb_path != module.path() {
            return Resolution::Unresolved(Unresolved::ModuleMismatch);
        }

        let il_offset = match select_il_offset(&method.il_offset_map, ip) {
            Some(offset) => match u32::try_from(offset) {
                Ok(offset) => offset,
                Err(_) => {
                    warn!("Didn't find IL offset for method \"{method}\"");
                    return Resolution::Unresolved(Unresolved::NegativeOffset(offset));
                }
            },
            None => {
                warn!("Didn't find IL offset for method \"{method}\"");
                return Resolution::Unresolved(Unresolved::NoOffsetMatch);
            }
        };

        match module.source_location(method.token, il_offset) {
            Ok(Some(loc)) => Resolution::Resolved(loc),
            Ok(None) => Resolution::Unresolved(Unresolved::NoSourceLocation),
            Err(e) => {
                warn!("Cannot read symbols for method \"{method}\": {e}");
                Resolution::Unresolved(Unresolved::LookupFailed(e.to_string()))
            }
        }
    }
}
