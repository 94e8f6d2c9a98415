//! Server list registration and mirror selection
//!
//! Each registered list is probed independently. Mirrors are tried in
//! declared order and the first one whose root document identifies it as a
//! fleet mirror becomes the list's connected server.

use std::collections::HashMap;

use indexmap::IndexMap;
use sprout_core::error::SproutError;
use sprout_core::types::{ConnectedServer, ServerList};
use tracing::{debug, info, warn};

use crate::api::is_identity_response;
use crate::transport::Transport;
use crate::RegistryResult;

/// Outcome of probing every registered list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    /// Lists that committed to a mirror
    pub connected: Vec<String>,
    /// Lists where no mirror answered correctly
    pub unconnected: Vec<String>,
}

impl ProbeSummary {
    /// Check whether every list found a mirror
    pub fn all_connected(&self) -> bool {
        self.unconnected.is_empty()
    }
}

/// Registered server lists and their probe results
#[derive(Debug, Default)]
pub struct ServerRegistry {
    /// Lists by name, in registration order
    lists: IndexMap<String, ServerList>,
    /// Connected server per list name
    connected: HashMap<String, ConnectedServer>,
}

impl ServerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a list under `name`, replacing any earlier list and its probe result
    pub fn register(&mut self, name: impl Into<String>, list: ServerList) {
        let name = name.into();
        if self.connected.remove(&name).is_some() {
            debug!("Server list '{}' re-registered, dropping its connection", name);
        }
        self.lists.insert(name, list);
    }

    /// Decode and register a list given in its published JSON form
    pub fn register_json(&mut self, name: impl Into<String>, json: &str) -> RegistryResult<()> {
        let name = name.into();
        let list = serde_json::from_str::<ServerList>(json)
            .map_err(|e| SproutError::json(&format!("server list '{}'", name), &e))?;
        self.register(name, list);
        Ok(())
    }

    /// Registered list by name
    pub fn list(&self, name: &str) -> Option<&ServerList> {
        self.lists.get(name)
    }

    /// Registered list names in registration order
    pub fn list_names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Connected server of a list, if probing found one
    pub fn connected(&self, name: &str) -> Option<&ConnectedServer> {
        self.connected.get(name).filter(|server| server.connected)
    }

    /// Check whether a list has a connected server
    pub fn is_connected(&self, name: &str) -> bool {
        self.connected(name).is_some()
    }

    /// Probe one list, committing to its first identifying mirror
    pub async fn probe_list<T>(&mut self, name: &str, transport: &T) -> RegistryResult<Option<&ConnectedServer>>
    where
        T: Transport + ?Sized,
    {
        let list = self
            .lists
            .get(name)
            .ok_or_else(|| SproutError::ServerListNotRegistered {
                name: name.to_string(),
            })?;

        self.connected.remove(name);

        let mut selected = None;
        for server in list.servers() {
            debug!("Probing {} ({}) for list '{}'", server.name, server.url, name);
            let body = transport.fetch(&server.url).await;

            if is_identity_response(&body) {
                let identity = String::from_utf8_lossy(&body).into_owned();
                info!("Server list '{}' connected to {} ({})", name, server.name, server.url);
                selected = Some(ConnectedServer::new(server.clone(), identity));
                break;
            }
            debug!("{} did not identify as a release server ({} bytes)", server.url, body.len());
        }

        match selected {
            Some(server) => {
                self.connected.insert(name.to_string(), server);
                Ok(self.connected.get(name))
            },
            None => {
                warn!("No server of list '{}' answered", name);
                Ok(None)
            },
        }
    }

    /// Probe every registered list
    pub async fn probe_all<T>(&mut self, transport: &T) -> ProbeSummary
    where
        T: Transport + ?Sized,
    {
        let names: Vec<String> = self.lists.keys().cloned().collect();
        let mut summary = ProbeSummary::default();

        for name in names {
            match self.probe_list(&name, transport).await {
                Ok(Some(_)) => summary.connected.push(name),
                _ => summary.unconnected.push(name),
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests;
