//! Dump pipeline
//!
//! ```text
//! acquire snapshot ─▶ heap scan (ThreadNameIndex) ─▶ per thread / per frame
//!                                                     (ReportAssembler)
//! ```
//!
//! Runs on one thread from start to finish. The snapshot handle is owned by
//! [`ThreadDumper::dump`] and released on every return path.

use log::{debug, info};
use std::path::PathBuf;
use std::rc::Rc;

use crate::domain::{SnapshotError, SymbolError};
use crate::introspection::{IntrospectionProvider, Target};
use crate::report::{Report, ReportAssembler};
use crate::symbolization::{DebugInfoModule, FrameSymbolicator, SymbolProvider};
use crate::thread_names::ThreadNameIndex;

/// What to dump and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    pub target: Target,
    /// Debug-info file; enables symbolication when set
    pub symbol_file: Option<PathBuf>,
    /// Trace symbol path matching to the log
    pub pdb_debug: bool,
}

/// Load the configured debug-info module, if any
///
/// # Errors
/// Returns an error if the symbol file can't be loaded
pub fn load_symbols(
    provider: &dyn SymbolProvider,
    config: &DumpConfig,
) -> Result<Option<Rc<dyn DebugInfoModule>>, SymbolError> {
    let Some(ref path) = config.symbol_file else {
        return Ok(None);
    };
    let module = provider.open(path)?;
    info!("Loaded symbols from {}", module.path());
    Ok(Some(module))
}

/// Produces thread reports from snapshots
pub struct ThreadDumper {
    symbolicator: FrameSymbolicator,
}

impl ThreadDumper {
    pub fn new(symbols: Option<Rc<dyn DebugInfoModule>>, pdb_debug: bool) -> Self {
        Self { symbolicator: FrameSymbolicator::new(symbols, pdb_debug) }
    }

    /// Build a dumper from a config, loading its symbol file
    ///
    /// # Errors
    /// Returns an error if the symbol file can't be loaded
    pub fn from_config(
        symbol_provider: &dyn SymbolProvider,
        config: &DumpConfig,
    ) -> Result<Self, SymbolError> {
        Ok(Self::new(load_symbols(symbol_provider, config)?, config.pdb_debug))
    }

    /// Snapshot `target` and report every thread
    ///
    /// Either a full report is returned or the snapshot could not be taken;
    /// per-object and per-frame failures only degrade the report.
    ///
    /// # Errors
    /// Returns an error if the snapshot can't be acquired
    pub fn dump(
        &self,
        provider: &dyn IntrospectionProvider,
        target: &Target,
    ) -> Result<Report, SnapshotError> {
        let snapshot = provider.acquire(target)?;
        debug!("Dumping {} threads of {target}", snapshot.runtime());

        let names = ThreadNameIndex::build(&*snapshot);
        let assembler = ReportAssembler::new(&names, &self.symbolicator);
        let report = assembler.assemble(snapshot.threads());
        Ok(report)
    }
}
