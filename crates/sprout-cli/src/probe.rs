//! Environment capability probe
//!
//! Runs once before any network activity. Creates, reads back and removes a
//! scratch file and a scratch directory in the installation root; every
//! capability that fails is reported as one deficiency line. A failed check
//! removes the directories it created for the root.

use std::fs;
use std::path::{Path, PathBuf};

use sprout_core::error::{SproutError, SproutResult};
use tracing::debug;

pub const CANT_CREATE_ROOT: &str = "Can't create the installation root (chmod)";
pub const CANT_CREATE_FILES: &str = "Can't create files (chmod)";
pub const CANT_READ_FILES: &str = "Can't read files (chmod)";
pub const CANT_REMOVE_FILES: &str = "Can't remove files (chmod)";
pub const CANT_CREATE_DIRS: &str = "Can't create directories (chmod)";
pub const CANT_REMOVE_DIRS: &str = "Can't remove directories (chmod)";

/// Deficiencies found in the installation root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentReport {
    pub deficiencies: Vec<String>,
}

impl EnvironmentReport {
    pub fn is_ok(&self) -> bool {
        self.deficiencies.is_empty()
    }

    /// Turn a failed probe into the fail-fast error
    pub fn into_result(self) -> SproutResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(SproutError::Environment {
                deficiencies: self.deficiencies,
            })
        }
    }
}

/// Probe `root`, creating it if it does not exist yet
pub fn check_environment(root: &Path) -> EnvironmentReport {
    check_environment_with(root, run_checks)
}

fn check_environment_with(root: &Path, checks: impl FnOnce(&Path) -> EnvironmentReport) -> EnvironmentReport {
    let created = missing_ancestors(root);
    let report = checks(root);

    if !report.is_ok() {
        remove_created(&created);
    }
    report
}

fn run_checks(root: &Path) -> EnvironmentReport {
    let mut report = EnvironmentReport::default();

    if let Err(e) = fs::create_dir_all(root) {
        debug!("Cannot create {}: {}", root.display(), e);
        report.deficiencies.push(CANT_CREATE_ROOT.to_string());
        return report;
    }

    let stamp = chrono::Utc::now().timestamp().to_string();

    if let Some(deficiency) = check_files(&root.join(format!("{}_file.dummy", stamp)), &stamp) {
        report.deficiencies.push(deficiency.to_string());
    }
    if let Some(deficiency) = check_dirs(&root.join(format!("{}_dir.dummy", stamp))) {
        report.deficiencies.push(deficiency.to_string());
    }

    report
}

/// `root` and its ancestors that do not exist yet, deepest first
fn missing_ancestors(root: &Path) -> Vec<PathBuf> {
    root.ancestors()
        .take_while(|path| !path.as_os_str().is_empty() && !path.exists())
        .map(Path::to_path_buf)
        .collect()
}

fn remove_created(created: &[PathBuf]) {
    for path in created {
        if path.is_dir() {
            if let Err(e) = fs::remove_dir(path) {
                debug!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}

fn check_files(path: &Path, contents: &str) -> Option<&'static str> {
    let _cleanup = Cleanup::file(path);

    if fs::write(path, contents).is_err() || !path.is_file() {
        return Some(CANT_CREATE_FILES);
    }

    match fs::read_to_string(path) {
        Ok(read) if read == contents => {},
        _ => return Some(CANT_READ_FILES),
    }

    if fs::remove_file(path).is_err() || path.exists() {
        return Some(CANT_REMOVE_FILES);
    }

    None
}

fn check_dirs(path: &Path) -> Option<&'static str> {
    let _cleanup = Cleanup::dir(path);

    if fs::create_dir(path).is_err() || !path.is_dir() {
        return Some(CANT_CREATE_DIRS);
    }

    if fs::remove_dir(path).is_err() || path.exists() {
        return Some(CANT_REMOVE_DIRS);
    }

    None
}

/// Removes a scratch artifact on drop if a check left it behind
struct Cleanup {
    path: PathBuf,
    dir: bool,
}

impl Cleanup {
    fn file(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            dir: false,
        }
    }

    fn dir(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            dir: true,
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        let result = if self.dir {
            fs::remove_dir(&self.path)
        } else {
            fs::remove_file(&self.path)
        };
        if let Err(e) = result {
            debug!("Failed to clean up {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writable_root_passes_and_is_left_clean() {
        let temp = tempdir().unwrap();
        let report = check_environment(temp.path());

        assert!(report.is_ok(), "{:?}", report);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_root_is_created() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("var/www/site");

        assert!(check_environment(&root).is_ok());
        assert!(root.is_dir());
    }

    #[test]
    fn test_failed_check_removes_created_directories() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("var/www/site");

        let report = check_environment_with(&root, |root| {
            let mut report = run_checks(root);
            report.deficiencies.push(CANT_REMOVE_DIRS.to_string());
            report
        });

        assert_eq!(report.deficiencies, vec![CANT_REMOVE_DIRS.to_string()]);
        assert!(!temp.path().join("var").exists());
        assert!(temp.path().is_dir());
    }

    #[test]
    fn test_passing_check_keeps_created_root() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("var")).unwrap();
        let root = temp.path().join("var/www");

        assert_eq!(missing_ancestors(&root), vec![root.clone()]);
        assert!(check_environment(&root).is_ok());
        assert!(root.is_dir());
    }

    #[test]
    fn test_root_that_is_a_file_fails() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("occupied");
        fs::write(&root, "not a directory").unwrap();

        let report = check_environment(&root);
        assert_eq!(report.deficiencies, vec![CANT_CREATE_ROOT.to_string()]);
        assert!(matches!(
            report.into_result(),
            Err(SproutError::Environment { .. })
        ));
    }
}
