//! sprout.toml parsing and validation

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sprout_archive::PermissionModes;
use sprout_core::error::SproutError;
use sprout_core::types::{PackageReference, ServerList, DEFAULT_MANIFEST_DIR};
use sprout_registry::{RetryConfig, TransportBackend, TransportConfig};
use url::Url;

use crate::ConfigResult;

/// Default handoff location after a successful run
pub const DEFAULT_POST_INSTALL: &str = "oswtools/";

/// Complete sprout.toml configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SproutToml {
    /// Installation root; relative paths resolve against the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Location handed to the operator after a clean run
    #[serde(default = "default_post_install")]
    pub post_install: String,

    /// Directory holding dependency manifests, relative to the root
    #[serde(default = "default_manifest_dir")]
    pub manifest_dir: PathBuf,

    #[serde(default)]
    pub permissions: PermissionsSection,

    #[serde(default)]
    pub transport: TransportSection,

    /// Server lists by name, in declaration order
    #[serde(default)]
    pub server_lists: IndexMap<String, ServerList>,

    /// Packages installed by a plain `sprout install`
    #[serde(default)]
    pub install: Vec<PackageReference>,
}

/// Modes for extracted entries; 0 selects the default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsSection {
    #[serde(default)]
    pub dir: u32,
    #[serde(default)]
    pub file: u32,
}

/// How mirrors are contacted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSection {
    /// Name this site reports to mirrors
    #[serde(default)]
    pub server_name: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Verify mirror TLS certificates; the public fleet is known to need `false`
    #[serde(default)]
    pub verify_tls: bool,

    #[serde(default)]
    pub backend: TransportBackend,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            server_name: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            verify_tls: false,
            backend: TransportBackend::default(),
        }
    }
}

fn default_post_install() -> String {
    DEFAULT_POST_INSTALL.to_string()
}

fn default_manifest_dir() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST_DIR)
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for SproutToml {
    fn default() -> Self {
        Self {
            root: None,
            post_install: default_post_install(),
            manifest_dir: default_manifest_dir(),
            permissions: PermissionsSection::default(),
            transport: TransportSection::default(),
            server_lists: IndexMap::new(),
            install: Vec::new(),
        }
    }
}

impl SproutToml {
    /// Installation root resolved against `cwd`
    pub fn root_dir(&self, cwd: &Path) -> PathBuf {
        match &self.root {
            Some(root) => cwd.join(root),
            None => cwd.to_path_buf(),
        }
    }

    /// Modes for the archive extractor
    pub fn permission_modes(&self) -> PermissionModes {
        PermissionModes::new(self.permissions.dir, self.permissions.file)
    }

    /// Transport settings for the registry and installer
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            server_name: self.transport.server_name.clone(),
            timeout: Duration::from_secs(self.transport.timeout_secs),
            verify_tls: self.transport.verify_tls,
            retry: RetryConfig {
                max_retries: self.transport.max_retries,
                ..RetryConfig::default()
            },
            ..TransportConfig::default()
        }
    }

    /// First declared server list, used when a package names none
    pub fn default_server_list(&self) -> Option<&str> {
        self.server_lists.keys().next().map(String::as_str)
    }
}

/// Parse a TOML string into a validated configuration
pub fn parse_sprout_toml(content: &str) -> ConfigResult<SproutToml> {
    // toml_edit first: it locates syntax errors precisely
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    let config: SproutToml =
        toml::from_str(content).map_err(|e| located_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate configuration completeness
pub fn validate_config(config: &SproutToml) -> ConfigResult<()> {
    for (name, list) in &config.server_lists {
        if name.trim().is_empty() {
            return Err(invalid("server_lists", "Server list names must not be empty".to_string()));
        }

        if list.is_empty() {
            return Err(invalid(
                &format!("server_lists.{}", name),
                "A server list needs at least one server".to_string(),
            ));
        }

        for server in list.servers() {
            Url::parse(&server.url).map_err(|e| {
                invalid(
                    &format!("server_lists.{}.data", name),
                    format!("Invalid server_url '{}': {}", server.url, e),
                )
            })?;
        }
    }

    for (index, reference) in config.install.iter().enumerate() {
        validate_reference(config, reference)
            .map_err(|reason| invalid(&format!("install[{}]", index), reason))?;
    }

    if config.transport.timeout_secs == 0 {
        return Err(invalid("transport.timeout_secs", "Timeout must be at least one second".to_string()));
    }

    Ok(())
}

/// Check one package reference against the configured lists
pub fn validate_reference(config: &SproutToml, reference: &PackageReference) -> Result<(), String> {
    if reference.package.trim().is_empty() {
        return Err("Package name must not be empty".to_string());
    }
    if reference.release.trim().is_empty() {
        return Err(format!("Release of '{}' must not be empty", reference.package));
    }
    if !config.server_lists.contains_key(&reference.serverlist) {
        return Err(format!(
            "'{}' refers to server list '{}', which is not configured",
            reference.package, reference.serverlist
        ));
    }
    Ok(())
}

/// Load and parse sprout.toml from a file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<SproutToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SproutError::io(format!("Failed to read {}", path), e))?;

    parse_sprout_toml(&content).map_err(|e| match e {
        SproutError::TomlParse {
            message,
            line,
            column,
        } => SproutError::TomlParse {
            message: format!("In file {}: {}", path, message),
            line,
            column,
        },
        SproutError::ConfigValidation { field, reason } => SproutError::ConfigValidation {
            field,
            reason: format!("In file {}: {}", path, reason),
        },
        other => other,
    })
}

fn invalid(field: &str, reason: String) -> SproutError {
    SproutError::ConfigValidation {
        field: field.to_string(),
        reason,
    }
}

fn located_error(content: &str, message: &str, span: Option<std::ops::Range<usize>>) -> SproutError {
    let (line, column) = span
        .map(|span| line_and_column(content, span.start))
        .unwrap_or((0, 0));

    SproutError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// One-based line and column of a byte offset
fn line_and_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = &content.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    (line, offset - line_start + 1)
}
