//! Sequence-point maps
//!
//! A sequence-point map is the JSON export of a managed debug-info file: a
//! document table plus, per method token, the sequence points that tie IL
//! offsets to source lines.
//!
//! ```json
//! {
//!   "documents": ["/src/App/Worker.cs"],
//!   "methods": [
//!     { "token": 100663297,
//!       "sequence_points": [ { "il_offset": 0, "document": 0, "line": 12 } ] }
//!   ]
//! }
//! ```

use super::{DebugInfoModule, SymbolProvider};
use crate::domain::{MethodToken, SourceLocation, SymbolError};
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use std::rc::Rc;

/// Line number compilers emit for compiler-generated code
pub const HIDDEN_LINE: u32 = 0x00FE_EFEE;

/// Maps an IL offset to a line in one of the map's documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SequencePoint {
    pub il_offset: u32,
    pub document: usize,
    pub line: u32,
}

impl SequencePoint {
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.line == HIDDEN_LINE
    }
}

#[derive(Debug, Deserialize)]
struct MethodRecord {
    token: MethodToken,
    #[serde(default)]
    sequence_points: Vec<SequencePoint>,
}

#[derive(Debug, Deserialize)]
struct SymbolMapDocument {
    #[serde(default)]
    documents: Vec<String>,
    #[serde(default)]
    methods: Vec<MethodRecord>,
}

/// An indexed sequence-point map
#[derive(Debug)]
pub struct SequencePointMap {
    path: String,
    documents: Vec<String>,
    /// Sequence points per method, sorted by IL offset
    methods: HashMap<MethodToken, Vec<SequencePoint>>,
}

impl SequencePointMap {
    /// Load and index a sequence-point map file
    ///
    /// # Errors
    /// Returns an error if the file can't be read or parsed
    pub fn load(path: &Path) -> Result<Self, SymbolError> {
        let open_err = |source| SymbolError::Open { path: path.to_path_buf(), source };
        let canonical = fs::canonicalize(path).map_err(open_err)?;
        let file = File::open(&canonical).map_err(open_err)?;

        let doc: SymbolMapDocument = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| SymbolError::Parse { path: path.to_path_buf(), source })?;

        Ok(Self::index(canonical.to_string_lossy().into_owned(), doc))
    }

    /// Parse a map from any reader, recording `path` as its canonical path
    ///
    /// # Errors
    /// Returns an error if the data isn't a valid sequence-point map
    pub fn from_reader<R: Read>(reader: R, path: impl Into<String>) -> Result<Self, SymbolError> {
        let path = path.into();
        let doc: SymbolMapDocument = serde_json::from_reader(reader)
            .map_err(|source| SymbolError::Parse { path: path.clone().into(), source })?;
        Ok(Self::index(path, doc))
    }

    fn index(path: String, doc: SymbolMapDocument) -> Self {
        let methods: HashMap<_, _> = doc
            .methods
            .into_iter()
            .map(|mut method| {
                method.sequence_points.sort_by_key(|p| p.il_offset);
                (method.token, method.sequence_points)
            })
            .collect();

        debug!(
            "Indexed {} methods across {} documents from {path}",
            methods.len(),
            doc.documents.len()
        );

        Self { path, documents: doc.documents, methods }
    }
}

impl DebugInfoModule for SequencePointMap {
    fn path(&self) -> &str {
        &self.path
    }

    fn source_location(
        &self,
        token: MethodToken,
        il_offset: u32,
    ) -> Result<Option<SourceLocation>, SymbolError> {
        let Some(points) = self.methods.get(&token) else {
            return Ok(None);
        };

        // Closest visible sequence point at or before the offset
        let Some(point) = points
            .iter()
            .take_while(|p| p.il_offset <= il_offset)
            .filter(|p| !p.is_hidden())
            .last()
        else {
            return Ok(None);
        };

        if point.line == 0 {
            return Err(SymbolError::Corrupt(format!(
                "method {token} has a sequence point at IL 0x{:x} with line 0",
                point.il_offset
            )));
        }

        let file = self
            .documents
            .get(point.document)
            .ok_or(SymbolError::MissingDocument { token, index: point.document })?;

        Ok(Some(SourceLocation { file: file.clone(), line: point.line }))
    }
}

/// Symbol provider for sequence-point map files
#[derive(Debug, Default, Clone, Copy)]
pub struct SequencePointProvider;

impl SymbolProvider for SequencePointProvider {
    fn open(&self, path: &Path) -> Result<Rc<dyn DebugInfoModule>, SymbolError> {
        Ok(Rc::new(SequencePointMap::load(path)?))
    }
}
