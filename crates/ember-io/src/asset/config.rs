// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::asset::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for an [`AssetDatabase`](crate::asset::AssetDatabase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDatabaseConfig {
    /// Number of threads loading, reloading and saving assets.
    pub max_worker_threads: u32,
    /// Prefix of the worker thread names; the worker index is appended.
    pub thread_name_prefix: String,
}

impl Default for AssetDatabaseConfig {
    fn default() -> Self {
        Self {
            max_worker_threads: 4,
            thread_name_prefix: "ember-asset".to_string(),
        }
    }
}

impl AssetDatabaseConfig {
    /// Parses a configuration from a RON document.
    ///
    /// Fields missing from the document keep their default values.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to a pretty RON document.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks the values for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_worker_threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssetDatabaseConfig::default();
        assert_eq!(config.max_worker_threads, 4);
        assert_eq!(config.thread_name_prefix, "ember-asset");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = AssetDatabaseConfig::from_ron_str("(max_worker_threads: 2)").unwrap();
        assert_eq!(config.max_worker_threads, 2);
        assert_eq!(config.thread_name_prefix, "ember-asset");
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        assert_eq!(
            AssetDatabaseConfig::from_ron_str("(max_worker_threads: 0)"),
            Err(ConfigError::NoWorkers)
        );
    }

    #[test]
    fn test_malformed_ron_is_a_parse_error() {
        let err = AssetDatabaseConfig::from_ron_str("(max_worker_threads: \"many\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_written_config_parses_back() {
        let config = AssetDatabaseConfig {
            max_worker_threads: 8,
            thread_name_prefix: "loader".to_string(),
        };
        let text = config.to_ron_string().unwrap();
        assert_eq!(AssetDatabaseConfig::from_ron_str(&text).unwrap(), config);
    }
}
