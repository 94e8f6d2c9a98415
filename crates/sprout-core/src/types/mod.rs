//! Core data types for Sprout installations.
//!
//! This module provides the fundamental types used throughout the installer:
//! - Server lists and the server chosen for each list after probing
//! - Package references and per-release dependency manifests

pub mod package;
pub mod server;

// Re-export all public types
pub use package::{DependencyManifest, PackageReference, RequiredPackages, DEFAULT_MANIFEST_DIR};
pub use server::{ConnectedServer, ServerDescriptor, ServerEntries, ServerList, ServerListInfo};
