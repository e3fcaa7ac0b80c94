use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the command-line tool.
///
/// Paths are resolved relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The course catalogue to load.
    ///
    /// The format is inferred from the extension: `.json`, `.yaml` or `.yml`.
    catalogue: PathBuf,

    /// The largest number of combinations to enumerate for a single
    /// requirement.
    ///
    /// Enumeration grows as `C(n, k)`, so requirements over this limit are
    /// refused rather than enumerated.
    pub combination_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalogue: default_catalogue(),
            combination_limit: default_combination_limit(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the path of the course catalogue.
    #[must_use]
    pub fn catalogue(&self) -> &Path {
        &self.catalogue
    }

    /// Overrides the path of the course catalogue.
    pub fn set_catalogue(&mut self, path: PathBuf) {
        self.catalogue = path;
    }
}

fn default_catalogue() -> PathBuf {
    PathBuf::from("courses.json")
}

const fn default_combination_limit() -> usize {
    10_000
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_catalogue")]
        catalogue: PathBuf,

        #[serde(default = "default_combination_limit")]
        combination_limit: usize,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                catalogue,
                combination_limit,
            } => Self {
                catalogue,
                combination_limit,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            catalogue: config.catalogue,
            combination_limit: config.combination_limit,
        }
    }
}
