//! Utility functions and helpers.
//!
//! Common functionality used across multiple Sprout crates.

pub mod hash;
pub mod path;

// Re-export commonly used utilities
pub use hash::{sha1_hex, verify_checksum};
pub use path::resolve_entry_path;
