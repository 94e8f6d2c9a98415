//! Zip extraction into the installation root
//!
//! Entries are classified the way the release fleet packs them: an entry with
//! zero stored size and a zero CRC-32 is a directory, anything else is a
//! file. Entry names are resolved against the root and entries that would
//! escape it are skipped.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sprout_core::error::SproutError;
use sprout_core::utils::resolve_entry_path;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::permissions::{apply_mode, PermissionModes};
use crate::ArchiveResult;

/// Counts of what an extraction produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Directory entries processed
    pub directories: usize,
    /// File entries written
    pub files: usize,
    /// Entries skipped because their path left the root
    pub rejected: usize,
    /// Entries that could not be written; extraction went on past them
    pub failed: usize,
}

/// Unpacks archives below a fixed root
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    root: PathBuf,
    modes: PermissionModes,
}

impl ArchiveExtractor {
    /// Create an extractor for `root` using `modes`
    pub fn new(root: impl Into<PathBuf>, modes: PermissionModes) -> Self {
        Self {
            root: root.into(),
            modes,
        }
    }

    /// Installation root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extract every entry of the archive at `archive_path`
    ///
    /// Only an unreadable or empty archive is an error. Entries that cannot
    /// be written are logged, counted and skipped.
    pub fn extract(&self, archive_path: &Path) -> ArchiveResult<ExtractSummary> {
        let archive_name = archive_path.display().to_string();
        let archive_error = |reason: String| SproutError::Archive {
            path: archive_name.clone(),
            reason,
        };

        let file = File::open(archive_path).map_err(|e| archive_error(e.to_string()))?;
        let mut archive = ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;

        if archive.len() == 0 {
            return Err(SproutError::EmptyArchive {
                path: archive_name.clone(),
            });
        }

        let mut summary = ExtractSummary::default();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| archive_error(format!("entry {}: {}", index, e)))?;

            let target = match resolve_entry_path(&self.root, entry.name()) {
                Ok(target) => target,
                Err(e) => {
                    warn!("Skipping entry of {}: {}", archive_name, e);
                    summary.rejected += 1;
                    continue;
                },
            };

            if entry.size() == 0 && entry.crc32() == 0 {
                match self.write_dir(&target) {
                    Ok(()) => summary.directories += 1,
                    Err(e) => {
                        warn!("Failed to create directory {}: {}", target.display(), e);
                        summary.failed += 1;
                    },
                }
            } else {
                match self.write_file(&target, &mut entry) {
                    Ok(()) => summary.files += 1,
                    Err(e) => {
                        warn!("Failed to write {}: {}", target.display(), e);
                        summary.failed += 1;
                    },
                }
            }
        }

        debug!(
            "Extracted {}: {} directories, {} files, {} rejected, {} failed",
            archive_name, summary.directories, summary.files, summary.rejected, summary.failed
        );

        Ok(summary)
    }

    fn write_dir(&self, target: &Path) -> io::Result<()> {
        if !target.is_dir() {
            fs::create_dir_all(target)?;
        }
        apply_mode(target, self.modes.dir);
        Ok(())
    }

    fn write_file(&self, target: &Path, contents: &mut impl io::Read) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(target)?;
        io::copy(contents, &mut out)?;
        apply_mode(target, self.modes.file);
        Ok(())
    }
}
