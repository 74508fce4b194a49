use archproof_core::{ArchProofError, Result};
use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extensions the scanner knows how to handle.
const SOURCE_EXTENSIONS: &[&str] = &["js", "ts", "py", "go"];

/// Directories that never contain deployable route code.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/target/**",
    "**/.git/**",
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/coverage/**",
    "**/__pycache__/**",
    "**/.pytest_cache/**",
];

/// Collect candidate source files under a directory, respecting gitignore
/// rules and the default exclusions.
pub fn collect_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    info!("Collecting source files from: {:?}", dir);

    let mut ovr = OverrideBuilder::new(dir);
    for exclude in DEFAULT_EXCLUDES {
        let _ = ovr.add(&format!("!{}", exclude));
    }
    let overrides = ovr
        .build()
        .map_err(|e| ArchProofError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let walker = WalkBuilder::new(dir)
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .ignore(true)
        .overrides(overrides)
        .build();

    let mut paths = Vec::new();
    for dent in walker {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                warn!("Walker error: {}", e);
                continue;
            }
        };
        let path = dent.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if SOURCE_EXTENSIONS.contains(&ext) {
            paths.push(path.to_path_buf());
        }
    }

    debug!("File collection complete: {} candidates", paths.len());
    Ok(paths)
}
