//! # sprout-core
//!
//! Core types and utilities shared across all Sprout crates.
//!
//! This crate provides:
//! - Server list descriptors as published by the release server fleet
//! - Package references and dependency manifests
//! - SproutError enum for unified error handling
//! - Checksum and path helpers used during installation
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (ServerList, PackageReference, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{SproutError, SproutResult};
pub use types::{
    ConnectedServer, DependencyManifest, PackageReference, ServerDescriptor, ServerList,
    ServerListInfo,
};
