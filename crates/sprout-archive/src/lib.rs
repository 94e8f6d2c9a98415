//! Package archive extraction for Sprout
//!
//! Unpacks downloaded zip archives into the installation root, normalizing
//! permissions and refusing entries that would land outside the root.

pub mod extract;
pub mod permissions;

// Re-export main types
pub use extract::{ArchiveExtractor, ExtractSummary};
pub use permissions::PermissionModes;

use sprout_core::error::SproutError;

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, SproutError>;
