//! Release server client for Sprout
//!
//! This crate talks to the release server fleet: it performs the raw GET
//! requests of the release protocol, builds the protocol's query strings, and
//! selects one reachable mirror per registered server list.

pub mod api;
pub mod servers;
pub mod transport;

// Re-export main types
pub use api::{Action, IDENTITY_MARKER};
pub use servers::{ProbeSummary, ServerRegistry};
pub use transport::{
    AutoTransport, HttpTransport, MemoryTransport, RetryConfig, StreamTransport, Transport,
    TransportBackend, TransportConfig,
};

use sprout_core::error::SproutError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, SproutError>;
