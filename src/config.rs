//! Analyzer configuration
//!
//! Loaded from `.mapcheck.yaml`, discovered by walking up from the working
//! directory. Every field has a default, so an empty file (or none at all)
//! means "all rules enabled at their default severity".
//!
//! ```yaml
//! rules:
//!   AM004:
//!     enabled: false
//!   AM006:
//!     severity: error
//! performance:
//!   mode: all
//!   max_projection_depth: 4
//! parallel: true
//! ```

use crate::diagnostic::{rule_info, Severity};
use crate::error::{Error, Result};
use crate::rules::performance::{PerformanceMode, DEFAULT_MAX_PROJECTION_DEPTH};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration file name
pub const CONFIG_FILE: &str = ".mapcheck.yaml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Per-rule overrides keyed by rule id (`AM001`)
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSetting>,

    /// Performance smell detection
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Analyze registrations on several threads
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            performance: PerformanceConfig::default(),
            parallel: true,
        }
    }
}

/// Override for one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RuleSetting {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replaces the rule's default severity
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Performance smell settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PerformanceConfig {
    /// `first` reports one smell per expression, `all` reports every smell
    #[serde(default)]
    pub mode: PerformanceMode,

    /// Nesting of LINQ projections reported as too deep
    #[serde(default = "default_projection_depth")]
    pub max_projection_depth: usize,
}

fn default_projection_depth() -> usize {
    DEFAULT_MAX_PROJECTION_DEPTH
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            mode: PerformanceMode::default(),
            max_projection_depth: DEFAULT_MAX_PROJECTION_DEPTH,
        }
    }
}

impl AnalyzerConfig {
    /// Parse YAML text and check rule ids
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AnalyzerConfig = if content.trim().is_empty() {
            AnalyzerConfig::default()
        } else {
            serde_norway::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::Io)?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Load the nearest `.mapcheck.yaml` above `start_dir`, or the defaults
    pub fn discover(start_dir: &Path) -> Result<Self> {
        match find_config(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let unknown: Vec<&str> = self
            .rules
            .keys()
            .filter(|id| rule_info(id).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(Error::Config(format!("Unknown rule id(s): {}", unknown.join(", "))));
        }
        Ok(())
    }

    fn setting(&self, rule_id: &str) -> Option<&RuleSetting> {
        self.rules
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(rule_id))
            .map(|(_, s)| s)
    }

    pub fn is_enabled(&self, rule_id: &str) -> bool {
        self.setting(rule_id).map(|s| s.enabled).unwrap_or(true)
    }

    /// Effective severity of a rule
    pub fn severity_for(&self, rule_id: &str, default: Severity) -> Severity {
        self.setting(rule_id).and_then(|s| s.severity).unwrap_or(default)
    }

    /// Turn a rule on or off
    pub fn set_enabled(&mut self, rule_id: &str, enabled: bool) {
        self.rules
            .entry(rule_id.to_ascii_uppercase())
            .or_insert(RuleSetting {
                enabled: true,
                severity: None,
            })
            .enabled = enabled;
    }
}

/// Walk up from `start_dir` to the first directory holding `.mapcheck.yaml`
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
