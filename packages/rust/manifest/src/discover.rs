//! Recursive search for manifest fragments.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace, warn};

use pubtools_shared::{PubtoolsError, Result};

/// Find every file named exactly `file_name` under `dir`.
///
/// Order is post-order: a directory's subdirectories are visited before its
/// own files, and siblings are sorted by name. Symlinked directories are
/// not followed; symlinks to files are included. An unreadable
/// subdirectory is skipped with a warning; an unreadable `dir` is an error.
/// `exclude` is never returned even if its name matches.
#[instrument(skip_all, fields(dir = %dir.display(), file_name = %file_name))]
pub fn discover_manifests(dir: &Path, file_name: &str, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PubtoolsError::validation(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut found = Vec::new();
    visit(dir, file_name, exclude, true, &mut found)?;

    debug!(count = found.len(), "manifest discovery complete");
    Ok(found)
}

fn visit(
    dir: &Path,
    file_name: &str,
    exclude: Option<&Path>,
    is_root: bool,
    found: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = match read_sorted(dir) {
        Ok(entries) => entries,
        Err(e) if !is_root => {
            warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| PubtoolsError::io(&path, e))?;

        if file_type.is_dir() {
            visit(&path, file_name, exclude, false, found)?;
        } else if entry.file_name() == file_name && is_regular_file(&path, file_type) {
            files.push(path);
        } else {
            trace!(path = %path.display(), "skipping entry");
        }
    }

    found.extend(files.into_iter().filter(|p| Some(p.as_path()) != exclude));
    Ok(())
}

fn read_sorted(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(|e| PubtoolsError::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| PubtoolsError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

fn is_regular_file(path: &Path, file_type: std::fs::FileType) -> bool {
    if file_type.is_symlink() {
        return std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    }
    file_type.is_file()
}
