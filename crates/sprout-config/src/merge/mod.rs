//! Configuration sources, environment overrides and CLI flag overrides

use std::collections::HashMap;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use sprout_core::error::SproutError;

use crate::defaults::builtin_config;
use crate::file::{load_from_file, validate_config, SproutToml};
use crate::ConfigResult;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sprout.toml";

/// Environment variables that override configuration values
pub const ENV_ROOT: &str = "SPROUT_ROOT";
pub const ENV_SERVER_NAME: &str = "SPROUT_SERVER_NAME";
pub const ENV_TIMEOUT_SECS: &str = "SPROUT_TIMEOUT_SECS";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// File given with --config
    Explicit(Utf8PathBuf),
    /// sprout.toml in the working directory
    Project(Utf8PathBuf),
    /// Compiled-in public server list
    BuiltIn,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit(path) | ConfigSource::Project(path) => write!(f, "{}", path),
            ConfigSource::BuiltIn => f.write_str("built-in defaults"),
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Working directory configuration paths resolve against
    pub fn cwd(&self) -> &Utf8Path {
        &self.cwd
    }

    /// Load the explicit file, else the project file, else the built-in defaults
    pub async fn load(&self, explicit: Option<&Utf8Path>) -> ConfigResult<(SproutToml, ConfigSource)> {
        if let Some(path) = explicit {
            let path = self.cwd.join(path);
            if !path.exists() {
                return Err(SproutError::ConfigValidation {
                    field: "config".to_string(),
                    reason: format!("Configuration file {} does not exist", path),
                });
            }
            let config = load_from_file(&path).await?;
            return Ok((config, ConfigSource::Explicit(path)));
        }

        let project = self.cwd.join(CONFIG_FILE_NAME);
        if project.exists() {
            let config = load_from_file(&project).await?;
            return Ok((config, ConfigSource::Project(project)));
        }

        Ok((builtin_config(), ConfigSource::BuiltIn))
    }
}

/// Values given on the command line; highest priority
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub server_name: Option<String>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

impl ConfigLayering {
    /// Apply environment then CLI overrides and re-validate
    pub fn merge_configs(
        config: SproutToml,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &CliOverrides,
    ) -> ConfigResult<SproutToml> {
        let mut merged = config;

        Self::apply_env_overrides(&mut merged, env_overrides)?;
        Self::apply_cli_overrides(&mut merged, cli_overrides);

        validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut SproutToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                ENV_ROOT => {
                    config.root = Some(PathBuf::from(value));
                },
                ENV_SERVER_NAME => {
                    config.transport.server_name = value.clone();
                },
                ENV_TIMEOUT_SECS => {
                    config.transport.timeout_secs =
                        value.trim().parse().map_err(|e| SproutError::ConfigValidation {
                            field: ENV_TIMEOUT_SECS.to_string(),
                            reason: format!("Invalid timeout '{}': {}", value, e),
                        })?;
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(())
    }

    fn apply_cli_overrides(config: &mut SproutToml, overrides: &CliOverrides) {
        if let Some(root) = &overrides.root {
            config.root = Some(root.clone());
        }
        if let Some(server_name) = &overrides.server_name {
            config.transport.server_name = server_name.clone();
        }
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("SPROUT_"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_SERVER_LIST;
    use tempfile::TempDir;

    fn temp_cwd() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    const PROJECT_TOML: &str = r#"
root = "site"

[transport]
server_name = "shop.example.com"

[server_lists.local.data.1]
server_id = "1"
server_name = "Local mirror"
server_url = "http://127.0.0.1:8080/index.php"

[[install]]
package = "tools.main"
release = "stable"
serverlist = "local"
"#;

    #[tokio::test]
    async fn test_falls_back_to_builtin() {
        let (_guard, cwd) = temp_cwd();
        let (config, source) = ConfigLoader::new(cwd).load(None).await.unwrap();

        assert_eq!(source, ConfigSource::BuiltIn);
        assert!(config.server_lists.contains_key(DEFAULT_SERVER_LIST));
    }

    #[tokio::test]
    async fn test_loads_project_file() {
        let (_guard, cwd) = temp_cwd();
        tokio::fs::write(cwd.join(CONFIG_FILE_NAME), PROJECT_TOML).await.unwrap();

        let (config, source) = ConfigLoader::new(cwd.clone()).load(None).await.unwrap();

        assert_eq!(source, ConfigSource::Project(cwd.join(CONFIG_FILE_NAME)));
        assert_eq!(config.transport.server_name, "shop.example.com");
        assert_eq!(config.root_dir(cwd.as_std_path()), cwd.as_std_path().join("site"));
    }

    #[tokio::test]
    async fn test_explicit_file_must_exist() {
        let (_guard, cwd) = temp_cwd();
        let loader = ConfigLoader::new(cwd);

        let result = loader.load(Some(Utf8Path::new("missing.toml"))).await;
        assert!(matches!(result, Err(SproutError::ConfigValidation { .. })));
    }

    #[tokio::test]
    async fn test_explicit_file_wins_over_project() {
        let (_guard, cwd) = temp_cwd();
        tokio::fs::write(cwd.join(CONFIG_FILE_NAME), PROJECT_TOML).await.unwrap();
        let other = PROJECT_TOML.replace("shop.example.com", "other.example.com");
        tokio::fs::write(cwd.join("other.toml"), other).await.unwrap();

        let (config, source) = ConfigLoader::new(cwd.clone())
            .load(Some(Utf8Path::new("other.toml")))
            .await
            .unwrap();

        assert_eq!(source, ConfigSource::Explicit(cwd.join("other.toml")));
        assert_eq!(config.transport.server_name, "other.example.com");
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = HashMap::from([
            (ENV_ROOT.to_string(), "/srv/env".to_string()),
            (ENV_SERVER_NAME.to_string(), "env.example.com".to_string()),
            (ENV_TIMEOUT_SECS.to_string(), "5".to_string()),
        ]);
        let cli = CliOverrides {
            root: Some(PathBuf::from("/srv/cli")),
            server_name: None,
        };

        let merged = ConfigLayering::merge_configs(builtin_config(), &env, &cli).unwrap();

        assert_eq!(merged.root, Some(PathBuf::from("/srv/cli")));
        assert_eq!(merged.transport.server_name, "env.example.com");
        assert_eq!(merged.transport.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_timeout_override() {
        let env = HashMap::from([(ENV_TIMEOUT_SECS.to_string(), "soon".to_string())]);
        let result = ConfigLayering::merge_configs(builtin_config(), &env, &CliOverrides::default());

        assert!(matches!(
            result,
            Err(SproutError::ConfigValidation { ref field, .. }) if field == ENV_TIMEOUT_SECS
        ));
    }

    #[test]
    fn test_zero_timeout_override_is_rejected() {
        let env = HashMap::from([(ENV_TIMEOUT_SECS.to_string(), "0".to_string())]);
        assert!(ConfigLayering::merge_configs(builtin_config(), &env, &CliOverrides::default()).is_err());
    }
}
