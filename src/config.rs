//! Configuration: TOML file, XDG default locations, and wiring.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. The binaries layer CLI flags and environment variables on
//! top of what is loaded here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::WorldResult;
use crate::oracle::{MajorityVote, OllamaConfig, OllamaOracle, Oracle};
use crate::resolver::{Resolver, ResolverConfig};
use crate::store::{self, TripleStore};

const APP_DIR: &str = "world-graph";

/// Errors from configuration loading.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(world::config::no_home),
        help("Set the HOME environment variable, or pass --data-dir and --config explicitly.")
    )]
    NoHome,

    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(world::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(world::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(world::config::invalid), help("Fix the value in the config file or on the command line."))]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// How the oracle is queried for a new pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One generation per pair.
    #[default]
    Simple,
    /// Several generations, majority answer wins.
    Sample,
}

/// Oracle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    #[serde(flatten)]
    pub ollama: OllamaConfig,
    pub strategy: Strategy,
    /// Generations per pair under [`Strategy::Sample`].
    pub samples: usize,
    /// Stored facts per input offered to the oracle as context.
    pub examples: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            strategy: Strategy::Simple,
            samples: 3,
            examples: 5,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    /// Directory of static UI files served at `/`.
    pub public_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3000,
            public_dir: None,
        }
    }
}

/// Top-level configuration, persisted as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Where the database lives. `None` means the XDG data directory.
    pub data_dir: Option<PathBuf>,
    /// Keep everything in memory; nothing survives the process.
    pub memory_only: bool,
    /// Elements every player starts with.
    pub seeds: Vec<String>,
    /// Enable the resolver's read-through cache.
    pub cache: bool,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub oracle: OracleSettings,
    pub server: ServerSettings,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            memory_only: false,
            seeds: default_seeds(),
            cache: false,
            log_level: "info".into(),
            oracle: OracleSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

fn default_seeds() -> Vec<String> {
    ["Water", "Fire", "Earth", "Air"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn xdg_dir(var: &str, fallback: &str) -> ConfigResult<PathBuf> {
    let base = match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(fallback))
            .map_err(|_| ConfigError::NoHome)?,
    };
    Ok(base.join(APP_DIR))
}

/// `$XDG_CONFIG_HOME/world-graph/config.toml`
pub fn default_config_path() -> ConfigResult<PathBuf> {
    Ok(xdg_dir("XDG_CONFIG_HOME", ".config")?.join("config.toml"))
}

/// `$XDG_DATA_HOME/world-graph/`
pub fn default_data_dir() -> ConfigResult<PathBuf> {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

impl WorldConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&text, &path.display().to_string())
    }

    /// Load an explicit file, else the default file if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Ok(default) if default.is_file() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid {
            message: format!("cannot serialize config: {e}"),
        })
    }

    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        let oracle = &self.oracle;
        if oracle.samples == 0 {
            return Err(ConfigError::Invalid {
                message: "oracle.samples must be at least 1".into(),
            });
        }
        if !(0.0..=2.0).contains(&oracle.ollama.temperature) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "oracle.temperature must be within [0, 2], got {}",
                    oracle.ollama.temperature
                ),
            });
        }
        if oracle.ollama.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "oracle.timeout_secs must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// The data directory in effect, or `None` when running memory-only.
    pub fn resolved_data_dir(&self) -> ConfigResult<Option<PathBuf>> {
        if self.memory_only {
            return Ok(None);
        }
        match &self.data_dir {
            Some(dir) => Ok(Some(dir.clone())),
            None => default_data_dir().map(Some),
        }
    }

    /// Open the configured store.
    pub fn open_store(&self) -> WorldResult<Arc<dyn TripleStore>> {
        let dir = self.resolved_data_dir()?;
        Ok(store::open(dir.as_deref())?)
    }

    /// Build the configured oracle.
    pub fn build_oracle(&self) -> Arc<dyn Oracle> {
        let ollama = OllamaOracle::new(self.oracle.ollama.clone());
        match self.oracle.strategy {
            Strategy::Simple => Arc::new(ollama),
            Strategy::Sample => Arc::new(MajorityVote::new(ollama, self.oracle.samples)),
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            examples: self.oracle.examples,
            cache: self.cache,
        }
    }

    /// Validate, then wire store, oracle, and resolver together.
    pub fn build_resolver(&self) -> WorldResult<Resolver> {
        self.validate()?;
        let store = self.open_store()?;
        tracing::info!(
            model = %self.oracle.ollama.model,
            strategy = ?self.oracle.strategy,
            triples = store.len()?,
            "resolver ready"
        );
        Ok(Resolver::new(
            store,
            self.build_oracle(),
            self.resolver_config(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = WorldConfig::from_toml("", "inline").unwrap();
        assert_eq!(config, WorldConfig::default());
        assert_eq!(config.seeds, vec!["Water", "Fire", "Earth", "Air"]);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.oracle.ollama.model, "neural-chat");
    }

    #[test]
    fn partial_document_overrides_fields() {
        let text = r#"
            seeds = ["Light", "Dark"]
            cache = true

            [oracle]
            model = "llama3.2"
            strategy = "sample"
            samples = 5

            [server]
            port = 8080
        "#;
        let config = WorldConfig::from_toml(text, "inline").unwrap();
        assert_eq!(config.seeds, vec!["Light", "Dark"]);
        assert!(config.cache);
        assert_eq!(config.oracle.ollama.model, "llama3.2");
        assert_eq!(config.oracle.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.oracle.strategy, Strategy::Sample);
        assert_eq!(config.oracle.samples, 5);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
    }

    #[test]
    fn malformed_document_is_parse_error() {
        let err = WorldConfig::from_toml("seeds = [", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = WorldConfig::default();
        config.oracle.strategy = Strategy::Sample;
        config.data_dir = Some(PathBuf::from("/tmp/world"));
        let text = config.to_toml().unwrap();
        assert_eq!(WorldConfig::from_toml(&text, "inline").unwrap(), config);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = WorldConfig::default();
        config.oracle.strategy = Strategy::Sample;
        config.oracle.samples = 0;
        assert!(config.validate().is_err());

        // Rejected even when the simple strategy would never read it.
        let mut config = WorldConfig::default();
        config.oracle.samples = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));

        let mut config = WorldConfig::default();
        config.oracle.ollama.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = WorldConfig::default();
        config.oracle.ollama.timeout_secs = 0;
        assert!(config.validate().is_err());

        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn memory_only_has_no_data_dir() {
        let config = WorldConfig {
            memory_only: true,
            data_dir: Some(PathBuf::from("/ignored")),
            ..Default::default()
        };
        assert_eq!(config.resolved_data_dir().unwrap(), None);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let config = WorldConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.log_level, "debug");

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            WorldConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn build_resolver_in_memory() {
        let config = WorldConfig {
            memory_only: true,
            ..Default::default()
        };
        let resolver = config.build_resolver().unwrap();
        assert!(resolver.store().is_empty().unwrap());
    }
}
