//! Check Configuration - target and failure policy

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::checker::CheckError;
use crate::target::{Locale, Platform};

/// How violations affect the verdict of a check.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Any violation makes the document invalid.
    #[default]
    Block,
    /// Document stays valid; each violation is logged as a warning.
    Warn,
    /// Document stays valid; violations are only recorded.
    Log,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckConfig {
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub failure_mode: FailureMode,
}

impl CheckConfig {
    pub fn new(platform: Platform, locale: Locale) -> Self {
        Self {
            platform,
            locale,
            failure_mode: FailureMode::default(),
        }
    }

    pub fn with_failure_mode(mut self, failure_mode: FailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CheckError> {
        let content = fs::read_to_string(path).map_err(|source| CheckError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CheckError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }
}
