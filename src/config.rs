// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration: a TOML file with defaults for every field, then environment
//! overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::generate::{Generator, MockGenerator, OpenAiGenerator, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::layout::LayoutConfig;
use crate::model::{IdError, OwnerId};
use crate::store::{FolderStore, MemoryStore, SessionStore, WriteDurability};

/// Read when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "branchtrail.toml";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_OWNER: &str = "BRANCHTRAIL_SESSION_USER_ID";
pub const ENV_PORT: &str = "BRANCHTRAIL_PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid {name}={value:?}: expected a port number")]
    Port { name: &'static str, value: String },

    #[error("invalid default owner: {0}")]
    Owner(#[from] IdError),

    #[error("the folder store needs [store] dir")]
    MissingStoreDir,

    #[error("the openai generator needs an API key ([generator] api_key or {ENV_API_KEY})")]
    MissingApiKey,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub generator: GeneratorConfig,
    pub layout: LayoutConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Owner used when a request carries no owner header.
    pub default_owner: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1".to_owned(), port: 3000, default_owner: "local-user".to_owned() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Folder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub dir: Option<PathBuf>,
    pub durable_writes: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    #[default]
    Mock,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub backend: GeneratorBackend,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: GeneratorBackend::Mock,
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned() }
    }
}

impl Config {
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Loads `path`, or [`DEFAULT_CONFIG_PATH`] when present, or the defaults. Environment
    /// overrides are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
                Self::read(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw, path)
    }

    /// Applies the `OPENAI_*` and `BRANCHTRAIL_*` overrides. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name).map(|value| value.trim().to_owned()).filter(|v| !v.is_empty())
        };

        if let Some(api_key) = get(ENV_API_KEY) {
            self.generator.api_key = Some(api_key);
            self.generator.backend = GeneratorBackend::OpenAi;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.generator.model = model;
        }
        if let Some(owner) = get(ENV_OWNER) {
            self.server.default_owner = owner;
        }
        if let Some(port) = get(ENV_PORT) {
            self.server.port =
                port.parse().map_err(|_| ConfigError::Port { name: ENV_PORT, value: port })?;
        }
        Ok(())
    }

    pub fn default_owner(&self) -> Result<OwnerId, ConfigError> {
        Ok(OwnerId::new(self.server.default_owner.as_str())?)
    }

    pub fn build_store(&self) -> Result<Arc<dyn SessionStore>, ConfigError> {
        match self.store.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreBackend::Folder => {
                let dir = self.store.dir.clone().ok_or(ConfigError::MissingStoreDir)?;
                let durability = if self.store.durable_writes {
                    WriteDurability::Durable
                } else {
                    WriteDurability::BestEffort
                };
                Ok(Arc::new(FolderStore::new(dir).with_durability(durability)))
            }
        }
    }

    pub fn build_generator(&self) -> Result<Arc<dyn Generator>, ConfigError> {
        match self.generator.backend {
            GeneratorBackend::Mock => Ok(Arc::new(MockGenerator::new())),
            GeneratorBackend::OpenAi => {
                let api_key = self.generator.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
                Ok(Arc::new(
                    OpenAiGenerator::new(api_key)
                        .with_base_url(self.generator.base_url.as_str())
                        .with_model(self.generator.model.as_str()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use rstest::rstest;

    use super::{Config, ConfigError, GeneratorBackend, StoreBackend, ENV_API_KEY, ENV_PORT};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml_str("", Path::new("t.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.generator.backend, GeneratorBackend::Mock);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_only_what_they_name() {
        let raw = r#"
            [server]
            port = 8080

            [store]
            backend = "folder"
            dir = "/tmp/sessions"
            durable_writes = true

            [generator]
            backend = "openai"
            api_key = "sk-test"

            [layout]
            min_lane_gap = 2.0
        "#;
        let config = Config::from_toml_str(raw, Path::new("t.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.store.backend, StoreBackend::Folder);
        assert!(config.store.durable_writes);
        assert_eq!(config.generator.backend, GeneratorBackend::OpenAi);
        assert_eq!(config.generator.model, "gpt-4o-mini");
        assert_eq!(config.layout.min_lane_gap, 2.0);
        assert_eq!(config.layout.layer_x_gap, 600.0);
        assert_eq!(config.build_store().unwrap().name(), "folder");
        assert_eq!(config.build_generator().unwrap().name(), "openai");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("[server]\nprot = 1\n", Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_win_and_api_key_selects_openai() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                (ENV_API_KEY, "sk-env"),
                ("OPENAI_MODEL", "gpt-4.1"),
                ("BRANCHTRAIL_SESSION_USER_ID", "alice"),
                (ENV_PORT, " 9000 "),
            ]))
            .unwrap();

        assert_eq!(config.generator.backend, GeneratorBackend::OpenAi);
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.generator.model, "gpt-4.1");
        assert_eq!(config.default_owner().unwrap().as_str(), "alice");
        assert_eq!(config.server.port, 9000);
    }

    #[rstest]
    #[case::blank("")]
    #[case::whitespace("   ")]
    fn blank_env_values_are_ignored(#[case] value: &str) {
        let mut config = Config::default();
        config.apply_env(env(&[(ENV_API_KEY, value), (ENV_PORT, value)])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bad_port_is_an_error() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[(ENV_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Port { .. }), "{err}");
    }

    #[test]
    fn incomplete_backends_are_errors() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Folder;
        assert!(matches!(config.build_store(), Err(ConfigError::MissingStoreDir)));

        config.generator.backend = GeneratorBackend::OpenAi;
        assert!(matches!(config.build_generator(), Err(ConfigError::MissingApiKey)));
    }
}
