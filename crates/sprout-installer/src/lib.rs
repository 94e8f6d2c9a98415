//! Package installation engine for Sprout
//!
//! Fetches packages from the mirror their server list connected to, checks
//! them against the published SHA-1, unpacks them into the installation root
//! and follows the dependency manifests they ship.

pub mod installer;
pub mod report;

// Re-export main types
pub use installer::{InstallerOptions, PackageInstaller};
pub use report::{ErrorLog, InstallOutcome, InstallReport, InstalledSet};

use sprout_core::error::SproutError;

/// Result type for installer operations
pub type InstallerResult<T> = Result<T, SproutError>;
