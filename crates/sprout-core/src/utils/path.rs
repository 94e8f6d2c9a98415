//! Path utilities for writing archive entries below the installation root.
//!
//! Archive entry names are untrusted: anything absolute or climbing above the
//! root via `..` is refused instead of being written.

use std::path::{Component, Path, PathBuf};

use crate::error::{SproutError, SproutResult};

/// Resolve an archive entry name to a path inside `root`
///
/// `.` components are dropped and `..` pops a previously pushed component.
/// Backslashes are treated as separators so Windows-built archives resolve
/// the same way on every platform.
pub fn resolve_entry_path(root: &Path, entry_name: &str) -> SproutResult<PathBuf> {
    let unsafe_path = || SproutError::UnsafePath {
        path: entry_name.to_string(),
    };

    let name = entry_name.replace('\\', "/");
    if name.starts_with('/') {
        return Err(unsafe_path());
    }

    let mut relative = PathBuf::new();
    for component in Path::new(&name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {},
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(unsafe_path());
                }
            },
            Component::RootDir | Component::Prefix(_) => return Err(unsafe_path()),
        }
    }

    Ok(root.join(relative))
}
