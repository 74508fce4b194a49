// ABOUTME: Framework-specific route extractors and their shared output shape.
// ABOUTME: Python idioms walk a tree-sitter AST; Express and Go match lexically.

pub mod express;
pub mod go;
pub mod python;

use archproof_core::Route;

/// What one extractor pulled out of a single source file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub routes: Vec<Route>,
    pub port: Option<u16>,
}

impl Extraction {
    /// Concatenate two extractions, first port wins.
    pub fn merge(mut self, other: Extraction) -> Extraction {
        self.routes.extend(other.routes);
        if self.port.is_none() {
            self.port = other.port;
        }
        self
    }
}

pub use express::ExpressExtractor;
pub use go::GoExtractor;
pub use python::{PythonIdiom, PythonRouteExtractor, UnknownIdiomOutcome};
