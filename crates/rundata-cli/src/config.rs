//! `rundata.toml`: optional overrides for layout, record defaults and plan
//! output. Every field has a default; unknown keys are rejected.

use rundata_kernel::{DEFAULT_TESTBED, Layout, Testbed};
use rundata_plan::DEFAULT_CODE_URL_PREFIX;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub layout: Layout,
    pub record: RecordConfig,
    pub plan: PlanConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordConfig {
    pub default_testbed: Testbed,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            default_testbed: DEFAULT_TESTBED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanConfig {
    pub code_url_prefix: String,
    pub title: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            code_url_prefix: DEFAULT_CODE_URL_PREFIX.to_string(),
            title: "Test Plan".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
