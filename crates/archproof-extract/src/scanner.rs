// ABOUTME: Per-file route scanning and the serialized merge into the
// ABOUTME: Service -> Routes document. Scans are parallel and share no state.
use archproof_core::{normalize, Framework, Route, RouteDocument, Service};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::detect::{self, GrammarFamily, PythonDetection};
use crate::extractors::{
    Extraction, ExpressExtractor, GoExtractor, PythonRouteExtractor, UnknownIdiomOutcome,
};

/// One file's scan outcome before service naming.
#[derive(Debug)]
struct FileScan {
    stem: String,
    file_path: String,
    framework: Framework,
    extraction: Extraction,
}

/// Scan a fixed set of source files into the implementation route document.
///
/// Individual files never fail the run: an unreadable or unparsable file
/// becomes an empty Unknown service and the diagnostic is logged.
pub fn scan_files(paths: &[PathBuf]) -> RouteDocument {
    let scans: Vec<FileScan> = paths.par_iter().map(|path| scan_file(path)).collect();
    merge(scans)
}

fn scan_file(path: &Path) -> FileScan {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let file_path = path.to_string_lossy().into_owned();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", file_path, e);
            return FileScan {
                stem,
                file_path,
                framework: Framework::Unknown,
                extraction: Extraction::default(),
            };
        }
    };

    let extension = path.extension().and_then(|e| e.to_str());
    let (framework, extraction) = match detect::grammar_family(extension) {
        GrammarFamily::JavaScript => (Framework::Express, ExpressExtractor::extract(&content)),
        GrammarFamily::Go => (Framework::Go, GoExtractor::extract(&content)),
        GrammarFamily::Python => scan_python(&content, &file_path),
        GrammarFamily::Other => {
            if detect::looks_like_express(&content) {
                (Framework::Express, ExpressExtractor::extract(&content))
            } else {
                debug!("No route grammar for {}", file_path);
                (Framework::Unknown, Extraction::default())
            }
        }
    };

    FileScan {
        stem,
        file_path,
        framework,
        extraction,
    }
}

fn scan_python(content: &str, file_path: &str) -> (Framework, Extraction) {
    let Some(tree) = PythonRouteExtractor::parse(content) else {
        warn!("Failed to parse {}", file_path);
        return (Framework::Unknown, Extraction::default());
    };

    match detect::detect_python_idiom(&tree, content) {
        PythonDetection::SingleMatch(idiom) => (
            idiom.framework(),
            PythonRouteExtractor::extract(idiom, &tree, content),
        ),
        PythonDetection::NoMatch => match PythonRouteExtractor::extract_unknown(&tree, content) {
            UnknownIdiomOutcome::Single(idiom, extraction) => (idiom.framework(), extraction),
            UnknownIdiomOutcome::Mixed(extraction) => (Framework::Mixed, extraction),
            UnknownIdiomOutcome::Neither { port } => (
                Framework::Unknown,
                Extraction {
                    routes: Vec::new(),
                    port,
                },
            ),
        },
    }
}

/// Serialized merge: run-global service naming and metadata totals.
fn merge(scans: Vec<FileScan>) -> RouteDocument {
    let mut document = RouteDocument::default();

    for scan in scans {
        let base = normalize::service_name(&scan.stem);
        let mut service_name = base.clone();
        let mut suffix = 1;
        while document.services.contains_key(&service_name) {
            suffix += 1;
            service_name = format!("{}{}", base, suffix);
        }

        document.services.insert(
            service_name,
            Service {
                port: scan.extraction.port,
                file_path: scan.file_path,
                framework: scan.framework,
                routes: dedup_routes(scan.extraction.routes),
            },
        );
    }

    document.recompute_metadata();
    document
}

/// Keep the first occurrence of each `(method, path, handler)` identity.
fn dedup_routes(routes: Vec<Route>) -> Vec<Route> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut unique = Vec::with_capacity(routes.len());
    for route in routes {
        let key = (
            route.method.clone(),
            route.path.clone(),
            route.handler.clone(),
        );
        if seen.insert(key) {
            unique.push(route);
        }
    }
    unique
}
