//! Permission modes applied to extracted entries

use std::path::Path;

use tracing::debug;

/// Default mode of extracted directories
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Default mode of extracted files
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Unix modes for extracted directories and files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionModes {
    pub dir: u32,
    pub file: u32,
}

impl Default for PermissionModes {
    fn default() -> Self {
        Self {
            dir: DEFAULT_DIR_MODE,
            file: DEFAULT_FILE_MODE,
        }
    }
}

impl PermissionModes {
    /// Build modes where `0` selects the default for that kind
    pub fn new(dir: u32, file: u32) -> Self {
        Self {
            dir: if dir == 0 { DEFAULT_DIR_MODE } else { dir },
            file: if file == 0 { DEFAULT_FILE_MODE } else { file },
        }
    }
}

/// Apply `mode` to `path`; failures are logged and otherwise ignored
#[cfg(unix)]
pub(crate) fn apply_mode(path: &Path, mode: u32) {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
        debug!("chmod {:o} {} failed: {}", mode, path.display(), e);
    }
}

#[cfg(not(unix))]
pub(crate) fn apply_mode(path: &Path, mode: u32) {
    debug!("Skipping mode {:o} for {} on this platform", mode, path.display());
}
