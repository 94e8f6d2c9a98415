//! Installation results
//!
//! Everything a run produces: which packages landed, what each requested or
//! discovered reference ended as, and the human-readable failures collected
//! along the way.

use std::fmt;

use indexmap::IndexSet;
use sprout_core::types::PackageReference;

/// Result of processing one package reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallOutcome {
    /// Fetched, verified and unpacked
    Installed,
    /// Already installed earlier in this run, nothing fetched
    AlreadyInstalled,
    /// The server list has no connected mirror
    NotConnected,
    /// Downloaded bytes do not match the published checksum
    ChecksumMismatch,
    /// The archive could not be written or unpacked
    ExtractionFailed,
}

impl InstallOutcome {
    /// Check whether the package is present after this outcome
    pub fn is_success(&self) -> bool {
        matches!(self, InstallOutcome::Installed | InstallOutcome::AlreadyInstalled)
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InstallOutcome::Installed => "installed",
            InstallOutcome::AlreadyInstalled => "already installed",
            InstallOutcome::NotConnected => "not connected",
            InstallOutcome::ChecksumMismatch => "checksum mismatched",
            InstallOutcome::ExtractionFailed => "can not unpacked",
        };
        f.write_str(text)
    }
}

/// Keys of installed packages in install order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    keys: IndexSet<String>,
}

impl InstalledSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; returns false if it was already present
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// Ordered, non-fatal failure messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    messages: Vec<String>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }
}

/// Summary of an installation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Every processed reference with its outcome, in processing order
    pub outcomes: Vec<(PackageReference, InstallOutcome)>,
    pub installed: InstalledSet,
    pub errors: ErrorLog,
}

impl InstallReport {
    /// A run succeeded when nothing was logged
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Outcome recorded for a key, the most recent one if processed twice
    pub fn outcome_of(&self, key: &str) -> Option<InstallOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(reference, _)| reference.key() == key)
            .map(|(_, outcome)| *outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_set_keeps_order_without_duplicates() {
        let mut set = InstalledSet::new();
        assert!(set.insert("main#b#stable"));
        assert!(set.insert("main#a#stable"));
        assert!(!set.insert("main#b#stable"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["main#b#stable", "main#a#stable"]);
    }

    #[test]
    fn test_outcome_success() {
        assert!(InstallOutcome::Installed.is_success());
        assert!(InstallOutcome::AlreadyInstalled.is_success());
        assert!(!InstallOutcome::NotConnected.is_success());
        assert!(!InstallOutcome::ChecksumMismatch.is_success());
        assert_eq!(InstallOutcome::ExtractionFailed.to_string(), "can not unpacked");
    }

    #[test]
    fn test_report_outcome_lookup() {
        let reference = PackageReference::new("tools.main", "stable", "main");
        let mut report = InstallReport::default();
        report.outcomes.push((reference.clone(), InstallOutcome::ChecksumMismatch));
        report.outcomes.push((reference.clone(), InstallOutcome::Installed));
        report.errors.push("main tools.main-stable: checksum mismatched");

        assert_eq!(report.outcome_of(&reference.key()), Some(InstallOutcome::Installed));
        assert_eq!(report.outcome_of("main#other#stable"), None);
        assert!(!report.is_success());
    }
}
