//! Test-unit discovery.
//!
//! Each immediate subdirectory of the module root is one test unit, run
//! independently of the others. Module contents are never interpreted here;
//! the provisioning tool decides what a directory means.

use crate::error::{Result, RigError};
use globset::GlobSet;
use std::path::{Path, PathBuf};

/// One module directory, treated as one independent pass/fail target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    /// Directory name, used for filtering and log records.
    pub name: String,
    /// Absolute or root-relative path to the module directory.
    pub path: PathBuf,
}

/// Enumerate test units under `root`.
///
/// Plain files are skipped, as are hidden directories (`.terraform` and
/// friends) and anything matching an exclude glob. Results are sorted by
/// name so runs are deterministic.
pub fn discover_modules(root: &Path, exclude: &GlobSet) -> Result<Vec<TestUnit>> {
    if !root.is_dir() {
        return Err(RigError::UserError(format!(
            "module root '{}' does not exist or is not a directory",
            root.display()
        )));
    }

    let entries = std::fs::read_dir(root).map_err(|e| {
        RigError::UserError(format!(
            "failed to read module root '{}': {}",
            root.display(),
            e
        ))
    })?;

    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            RigError::UserError(format!(
                "failed to read entry under '{}': {}",
                root.display(),
                e
            ))
        })?;

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || exclude.is_match(&name) {
            continue;
        }

        units.push(TestUnit { name, path });
    }

    units.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(units)
}
