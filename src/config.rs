//! Settings loaded from `places.toml`.

use crate::data::{CanonicalColumn, Expiry, LoadOptions, PLACES_COUNTY_CSV};
use crate::report::{DEFAULT_PRECISION, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "places.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Application settings. Every field has a default so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source_url: String,
    pub reports_dir: PathBuf,
    pub top_n: usize,
    pub precision: usize,
    pub group_column: String,
    pub value_column: String,
    pub default_state: String,
    /// Seconds a downloaded dataset stays valid; unset means until restart.
    pub cache_ttl_secs: Option<u64>,
    pub limit_rows: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: PLACES_COUNTY_CSV.to_string(),
            reports_dir: PathBuf::from("reports"),
            top_n: DEFAULT_TOP_N,
            precision: DEFAULT_PRECISION,
            group_column: CanonicalColumn::County.name().to_string(),
            value_column: CanonicalColumn::Value.name().to_string(),
            default_state: "PA".to_string(),
            cache_ttl_secs: None,
            limit_rows: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Explicit path if given, else `places.toml` in the working directory
    /// when it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn expiry(&self) -> Expiry {
        match self.cache_ttl_secs {
            Some(secs) => Expiry::After(chrono::Duration::seconds(secs as i64)),
            None => Expiry::Never,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            limit_rows: self.limit_rows,
        }
    }
}
