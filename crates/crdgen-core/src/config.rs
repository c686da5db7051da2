//! Generation configuration
//!
//! Loaded from a YAML file and optionally overridden from the command line:
//!
//! ```yaml
//! input: crds/atlas.yaml
//! output: generated/
//! version: v1
//! skipList: [Legacy]
//! renames:
//!   Entry: GroupEntry
//! reserved: [Spec]
//! imports:
//!   - name: Reference
//!     path: atlas_refs::k8s
//! errorPolicy: abort
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CoreError, Result};

/// What the stream driver does when one document fails to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the whole run at the first failing document
    #[default]
    Abort,
    /// Report the failure and continue with the next document
    Skip,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown error policy '{}' (expected abort or skip)", other)),
        }
    }
}

/// A type name pre-bound to an externally defined type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedType {
    /// Type name as it would be generated (after renames)
    pub name: String,
    /// Module path of the external type (e.g., "k8s_openapi::api::core::v1")
    pub path: String,
    /// Alias used to refer to the module; defaults to the last path segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ImportedType {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            alias: None,
        }
    }

    /// Explicit alias, or the last segment of the module path
    pub fn effective_alias(&self) -> String {
        match &self.alias {
            Some(alias) if !alias.is_empty() => alias.clone(),
            _ => last_segment(&self.path).to_string(),
        }
    }
}

/// Last segment of a `::` or `/` separated module path
fn last_segment(path: &str) -> &str {
    path.rsplit(['/', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// Configuration for one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateConfig {
    /// CRD YAML stream to read
    pub input: Option<PathBuf>,
    /// Directory to write into
    pub output: Option<PathBuf>,
    /// Version to generate; empty selects each CRD's first version
    pub version: String,
    /// Kinds to ignore
    pub skip_list: Vec<String>,
    /// Forced type names (original name -> forced name)
    pub renames: BTreeMap<String, String>,
    /// Names to keep unavailable for generated types
    pub reserved: Vec<String>,
    /// Pre-bound external types
    pub imports: Vec<ImportedType>,
    /// Per-document failure policy
    pub error_policy: ErrorPolicy,
}

impl GenerateConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_yaml(&content).map_err(|e| CoreError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a `FROM=TO` rename and add it
    pub fn add_rename(&mut self, spec: &str) -> Result<()> {
        let (from, to) = spec
            .split_once('=')
            .filter(|(from, to)| !from.is_empty() && !to.is_empty())
            .ok_or_else(|| CoreError::invalid(format!("rename '{}' must be FROM=TO", spec)))?;
        self.renames.insert(from.to_string(), to.to_string());
        Ok(())
    }

    /// Whether a kind is on the skip list
    pub fn skips(&self, kind: &str) -> bool {
        self.skip_list.iter().any(|k| k == kind)
    }
}
