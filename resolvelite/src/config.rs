// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine initialization configuration
//!
//! The engine is initialized from a JSON document of the form
//!
//! ```text
//! {
//!   "PIPELINE": {"CONFIGPATH": "...", "SUPPORTPATH": "...", "RESOURCEPATH": "..."},
//!   "SQL": {"CONNECTION": "sled:///var/resolvelite/project/var/sqldb"}
//! }
//! ```
//!
//! The document is either supplied verbatim through
//! [`ENGINE_CONFIGURATION_ENV`] or derived from a project directory
//! ([`PROJECT_DIR_ENV`], falling back to [`DEFAULT_PROJECT_DIR`]).

use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding a complete configuration document
pub const ENGINE_CONFIGURATION_ENV: &str = "RESOLVELITE_ENGINE_CONFIGURATION_JSON";

/// Environment variable selecting the project directory
pub const PROJECT_DIR_ENV: &str = "RESOLVELITE_PROJECT_DIR";

/// Project directory used when [`PROJECT_DIR_ENV`] is not set
pub const DEFAULT_PROJECT_DIR: &str = "/var/resolvelite/project";

static CONNECTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<scheme>[a-z][a-z0-9+]*)://(?P<rest>.*)$").expect("valid connection regex")
});

/// Complete engine configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(rename = "PIPELINE")]
    pub pipeline: PipelineConfig,

    #[serde(rename = "SQL")]
    pub sql: SqlConfig,
}

/// Resource locations used by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "CONFIGPATH")]
    pub config_path: PathBuf,

    #[serde(rename = "SUPPORTPATH")]
    pub support_path: PathBuf,

    #[serde(rename = "RESOURCEPATH")]
    pub resource_path: PathBuf,
}

/// Datastore connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlConfig {
    #[serde(rename = "CONNECTION")]
    pub connection: String,
}

/// Parsed form of `SQL.CONNECTION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// `memory://[name]` - volatile datastore, dropped with the engine
    Memory { name: String },

    /// `sled://<path>` - embedded persistent datastore
    Sled { path: PathBuf },
}

impl ConnectionTarget {
    /// Parse a connection string
    pub fn parse(connection: &str) -> EngineResult<Self> {
        let captures = CONNECTION_PATTERN.captures(connection.trim()).ok_or_else(|| {
            EngineError::Configuration(format!(
                "Malformed connection string '{}': expected <scheme>://<location>",
                connection
            ))
        })?;

        let rest = &captures["rest"];
        match &captures["scheme"] {
            "memory" => Ok(ConnectionTarget::Memory {
                name: if rest.is_empty() {
                    "default".to_string()
                } else {
                    rest.to_string()
                },
            }),
            "sled" => {
                if rest.is_empty() {
                    return Err(EngineError::Configuration(
                        "sled connection requires a datastore path".to_string(),
                    ));
                }
                Ok(ConnectionTarget::Sled {
                    path: PathBuf::from(rest),
                })
            }
            other => Err(EngineError::Configuration(format!(
                "Unsupported connection scheme '{}'. Valid options: sled, memory",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionTarget::Memory { name } => write!(f, "memory://{}", name),
            ConnectionTarget::Sled { path } => write!(f, "sled://{}", path.display()),
        }
    }
}

impl EngineConfig {
    /// Load the configuration from the environment
    ///
    /// [`ENGINE_CONFIGURATION_ENV`] wins when set; otherwise the layout is
    /// derived from [`PROJECT_DIR_ENV`] or [`DEFAULT_PROJECT_DIR`].
    pub fn from_env() -> EngineResult<Self> {
        if let Ok(json) = std::env::var(ENGINE_CONFIGURATION_ENV) {
            if !json.trim().is_empty() {
                log::debug!("Using configuration from {}", ENGINE_CONFIGURATION_ENV);
                return Self::from_json(&json);
            }
        }

        let project_dir = std::env::var(PROJECT_DIR_ENV)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROJECT_DIR.to_string());
        log::debug!("Using project directory {}", project_dir);
        Ok(Self::for_project_dir(project_dir))
    }

    /// Derive the standard layout below a project directory
    pub fn for_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        let dir = project_dir.as_ref();
        EngineConfig {
            pipeline: PipelineConfig {
                config_path: dir.join("etc"),
                support_path: dir.join("data"),
                resource_path: dir.join("resources"),
            },
            sql: SqlConfig {
                connection: format!("sled://{}", dir.join("var").join("sqldb").display()),
            },
        }
    }

    /// Create the project directory layout and return its configuration
    pub fn init_project_dir<P: AsRef<Path>>(project_dir: P) -> EngineResult<Self> {
        let dir = project_dir.as_ref();
        for sub in ["etc", "data", "resources", "var"] {
            std::fs::create_dir_all(dir.join(sub)).map_err(|e| {
                EngineError::Configuration(format!(
                    "Failed to create {}: {}",
                    dir.join(sub).display(),
                    e
                ))
            })?;
        }
        Ok(Self::for_project_dir(dir))
    }

    /// Replace the connection string, keeping the pipeline paths
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.sql.connection = connection.into();
        self
    }

    /// Parse a configuration document
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::Configuration(format!("Invalid configuration JSON: {}", e)))
    }

    /// Serialize to the configuration document
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parsed datastore connection
    pub fn connection_target(&self) -> EngineResult<ConnectionTarget> {
        ConnectionTarget::parse(&self.sql.connection)
    }

    /// Check that every path exists and the connection is reachable
    pub fn validate(&self) -> EngineResult<ConnectionTarget> {
        let paths = [
            ("CONFIGPATH", &self.pipeline.config_path),
            ("SUPPORTPATH", &self.pipeline.support_path),
            ("RESOURCEPATH", &self.pipeline.resource_path),
        ];
        for (key, path) in paths {
            if !path.is_dir() {
                return Err(EngineError::Configuration(format!(
                    "PIPELINE.{} '{}' is not an existing directory",
                    key,
                    path.display()
                )));
            }
        }

        let target = self.connection_target()?;
        if let ConnectionTarget::Sled { path } = &target {
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(parent) = parent {
                if !parent.is_dir() {
                    return Err(EngineError::Configuration(format!(
                        "Datastore directory '{}' is unreachable",
                        parent.display()
                    )));
                }
            }
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connection_targets() {
        assert_eq!(
            ConnectionTarget::parse("memory://").unwrap(),
            ConnectionTarget::Memory {
                name: "default".to_string()
            }
        );
        assert_eq!(
            ConnectionTarget::parse("sled:///tmp/er").unwrap(),
            ConnectionTarget::Sled {
                path: PathBuf::from("/tmp/er")
            }
        );
        assert!(ConnectionTarget::parse("sqlite3://na:na@/tmp/G2C.db").is_err());
        assert!(ConnectionTarget::parse("/tmp/G2C.db").is_err());
        assert!(ConnectionTarget::parse("sled://").is_err());
    }

    #[test]
    fn test_json_shape() {
        let config = EngineConfig::for_project_dir("/opt/er");
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(value["PIPELINE"]["CONFIGPATH"], "/opt/er/etc");
        assert_eq!(value["PIPELINE"]["SUPPORTPATH"], "/opt/er/data");
        assert_eq!(value["PIPELINE"]["RESOURCEPATH"], "/opt/er/resources");
        assert_eq!(value["SQL"]["CONNECTION"], "sled:///opt/er/var/sqldb");
    }

    #[test]
    fn test_validate_missing_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::for_project_dir(temp_dir.path().join("missing"));
        match config.validate() {
            Err(EngineError::Configuration(msg)) => assert!(msg.contains("CONFIGPATH")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_init_project_dir_validates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::init_project_dir(temp_dir.path()).unwrap();
        let target = config.validate().unwrap();
        assert!(matches!(target, ConnectionTarget::Sled { .. }));
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        assert!(matches!(
            EngineConfig::from_json("{\"PIPELINE\": 1}"),
            Err(EngineError::Configuration(_))
        ));
    }
}
