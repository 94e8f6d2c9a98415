//! Server list descriptors.
//!
//! A server list is the JSON document the release fleet publishes for one
//! logical package source: a small `info` header plus the candidate mirrors
//! under `data`, in the order they should be tried.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{SproutError, SproutResult};

/// One candidate mirror of a server list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Server identity
    #[serde(rename = "server_id")]
    pub id: String,
    /// Display name
    #[serde(rename = "server_name")]
    pub name: String,
    /// Base URL every request for this server is built from
    #[serde(rename = "server_url")]
    pub url: String,
}

/// Metadata header of a server list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerListInfo {
    /// Human readable list name
    #[serde(default)]
    pub name: String,
    /// Main package served by this list
    #[serde(default)]
    pub package: String,
}

/// Mirrors of a list, either keyed (`{"1": {...}}`) or as a plain array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerEntries {
    /// Object keyed by position labels; insertion order is the declared order
    Keyed(IndexMap<String, ServerDescriptor>),
    /// Plain array in declared order
    Sequence(Vec<ServerDescriptor>),
}

/// Named, ordered collection of candidate mirrors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerList {
    /// List metadata
    #[serde(default)]
    pub info: ServerListInfo,
    /// Candidate servers
    pub data: ServerEntries,
}

impl ServerList {
    /// Build a list from mirrors given in probe order
    pub fn new(info: ServerListInfo, servers: Vec<ServerDescriptor>) -> Self {
        Self {
            info,
            data: ServerEntries::Sequence(servers),
        }
    }

    /// Decode a list from the JSON form published by the release fleet
    pub fn from_json(json: &str) -> SproutResult<Self> {
        serde_json::from_str(json).map_err(|e| SproutError::json("server list", &e))
    }

    /// Servers in declared order
    pub fn servers(&self) -> Box<dyn Iterator<Item = &ServerDescriptor> + '_> {
        match &self.data {
            ServerEntries::Keyed(map) => Box::new(map.values()),
            ServerEntries::Sequence(list) => Box::new(list.iter()),
        }
    }

    /// Number of candidate servers
    pub fn len(&self) -> usize {
        match &self.data {
            ServerEntries::Keyed(map) => map.len(),
            ServerEntries::Sequence(list) => list.len(),
        }
    }

    /// Check whether the list has no candidates at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The mirror a server list committed to after probing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedServer {
    /// Selected mirror
    #[serde(flatten)]
    pub server: ServerDescriptor,
    /// Always true for a recorded connection
    pub connected: bool,
    /// Literal identity string the mirror answered with
    pub identity: String,
}

impl ConnectedServer {
    /// Record a successful probe
    pub fn new(server: ServerDescriptor, identity: String) -> Self {
        Self {
            server,
            connected: true,
            identity,
        }
    }

    /// Base URL of the selected mirror
    pub fn base_url(&self) -> &str {
        &self.server.url
    }
}
