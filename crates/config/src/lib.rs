//! Configuration loading, validation, and management for whisperclaw.
//!
//! Loads configuration from `~/.whisperclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.whisperclaw/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// The fixed system prompt injected ahead of every turn.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Persistent store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Context assembly settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Categorizer settings
    #[serde(default)]
    pub categorizer: CategorizerConfig,

    /// Seed categories loaded into the store on first run:
    /// category name → keyword list.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            store: StoreConfig::default(),
            context: ContextConfig::default(),
            categorizer: CategorizerConfig::default(),
            categories: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database file path; defaults to `~/.whisperclaw/context.sqlite`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Total token budget for the assembled context
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Share of the budget for key points
    #[serde(default = "default_share")]
    pub key_point_share: f32,

    /// Share of the budget for recent interactions
    #[serde(default = "default_share")]
    pub interaction_share: f32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            key_point_share: default_share(),
            interaction_share: default_share(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizerConfig {
    /// Apply keyword proposals unconditionally at commit time
    #[serde(default = "default_true")]
    pub auto_expand: bool,

    /// Catch-all category for unassignable entities
    #[serde(default = "default_fallback")]
    pub fallback_category: String,

    /// Minimum token-overlap score for category assignment
    #[serde(default = "default_min_overlap")]
    pub min_overlap: f32,

    /// Extra stop-words on top of the built-in list
    #[serde(default)]
    pub stop_words: Vec<String>,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            auto_expand: default_true(),
            fallback_category: default_fallback(),
            min_overlap: default_min_overlap(),
            stop_words: Vec::new(),
        }
    }
}

fn default_system_prompt() -> String {
    "You are an AI assistant specialized in software development. \
     Use the provided key points and recent conversation as ground truth \
     about this project, and answer with practical, technically accurate \
     advice."
        .into()
}
fn default_backend() -> String {
    "sqlite".into()
}
fn default_token_budget() -> usize {
    4096
}
fn default_share() -> f32 {
    1.0 / 3.0
}
fn default_true() -> bool {
    true
}
fn default_fallback() -> String {
    "general".into()
}
fn default_min_overlap() -> f32 {
    0.34
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to write config at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Load from the default location with env overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path. A missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Environment variable overrides (highest priority). `lookup` is
    /// injected so the logic stays testable without touching the
    /// process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("WHISPERCLAW_DB") {
            self.store.path = Some(PathBuf::from(path));
        }
        if let Some(backend) = lookup("WHISPERCLAW_BACKEND") {
            self.store.backend = backend;
        }
        if let Some(budget) = lookup("WHISPERCLAW_TOKEN_BUDGET")
            && let Ok(budget) = budget.parse()
        {
            self.context.token_budget = budget;
        }
        if let Some(auto) = lookup("WHISPERCLAW_AUTO_EXPAND") {
            self.categorizer.auto_expand = matches!(auto.as_str(), "1" | "true" | "yes");
        }
    }

    /// Validate all settings. Called on every load.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.token_budget == 0 {
            return Err(ConfigError::Invalid("token_budget must be positive".into()));
        }
        for (name, share) in [
            ("key_point_share", self.context.key_point_share),
            ("interaction_share", self.context.interaction_share),
        ] {
            if !(0.0..=1.0).contains(&share) {
                return Err(ConfigError::Invalid(format!("{name} must be within 0..=1")));
            }
        }
        if self.context.key_point_share + self.context.interaction_share > 1.0 {
            return Err(ConfigError::Invalid(
                "key_point_share + interaction_share must leave headroom (sum <= 1)".into(),
            ));
        }
        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::Invalid(format!(
                "unknown store backend {:?} (expected \"sqlite\" or \"memory\")",
                self.store.backend
            )));
        }
        if self.categorizer.fallback_category.trim().is_empty() {
            return Err(ConfigError::Invalid("fallback_category must be non-empty".into()));
        }
        if !(0.0..=1.0).contains(&self.categorizer.min_overlap) {
            return Err(ConfigError::Invalid("min_overlap must be within 0..=1".into()));
        }
        Ok(())
    }

    /// `~/.whisperclaw`
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".whisperclaw")
    }

    /// The effective database path.
    pub fn db_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("context.sqlite"))
    }

    /// The seed category map shipped with `onboard`: the software
    /// development topics this assistant is tuned for.
    pub fn default_categories() -> BTreeMap<String, Vec<String>> {
        let seed: &[(&str, &[&str])] = &[
            (
                "requirements",
                &["requirements", "specifications", "needs", "criteria", "goals", "objectives", "user story"],
            ),
            (
                "architecture and design",
                &["architecture", "design", "structure", "blueprint", "framework", "model", "diagram", "pattern"],
            ),
            (
                "implementation",
                &["implementation", "coding", "development", "function", "method", "procedure", "class", "module", "algorithm"],
            ),
            (
                "testing",
                &["testing", "tests", "validation", "verification", "unit test", "integration test", "test case", "test plan", "qa"],
            ),
            (
                "external apis",
                &["api", "external service", "integration", "third-party service", "rest", "soap", "webhook", "endpoint", "api key"],
            ),
            (
                "deployment",
                &["deployment", "release", "environment", "production", "staging", "ci/cd", "pipeline", "rollout", "rollback"],
            ),
            (
                "documentation",
                &["documentation", "doc", "readme", "guide", "manual", "comments", "annotations", "spec"],
            ),
            (
                "project management",
                &["project management", "timeline", "milestones", "tasks", "issues", "tickets", "backlog", "sprint", "agile", "kanban", "scrum"],
            ),
        ];

        seed.iter()
            .map(|(name, keywords)| {
                (
                    name.to_string(),
                    keywords.iter().map(|k| k.to_string()).collect(),
                )
            })
            .collect()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn toml_round_trip() {
        let mut config = AppConfig::default();
        config.categories = AppConfig::default_categories();
        config.context.token_budget = 8192;

        let toml = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&toml).unwrap();
        assert_eq!(back.context.token_budget, 8192);
        assert_eq!(back.categories.len(), 8);
        assert!(back.categories["testing"].contains(&"unit test".to_string()));
    }

    #[test]
    fn shares_must_leave_headroom() {
        let mut config = AppConfig::default();
        config.context.key_point_share = 0.7;
        config.context.interaction_share = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "postgres".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_win() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "WHISPERCLAW_DB" => Some("/tmp/other.sqlite".into()),
            "WHISPERCLAW_TOKEN_BUDGET" => Some("2048".into()),
            "WHISPERCLAW_AUTO_EXPAND" => Some("false".into()),
            _ => None,
        });
        assert_eq!(config.store.path.as_deref(), Some(Path::new("/tmp/other.sqlite")));
        assert_eq!(config.context.token_budget, 2048);
        assert!(!config.categorizer.auto_expand);
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.store.backend, "sqlite");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.categorizer.fallback_category = "misc".into();
        config.save(&path).unwrap();

        let back = AppConfig::load_from(&path).unwrap();
        assert_eq!(back.categorizer.fallback_category, "misc");
    }
}
