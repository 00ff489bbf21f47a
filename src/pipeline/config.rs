use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::path::resolve::parse_selector;
use crate::pipeline::error::MapperError;

// ============================================================================
// Mapper configuration
// ============================================================================

/// Settings shared by every phase of the mapping pipeline.
///
/// The same root selector and token prefix must be used at embedding,
/// mapping and query time; structural paths from different conventions
/// never match each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Selector for the element all structural paths are relative to
    #[serde(default = "default_root_selector")]
    pub root_selector: String,

    /// Selectors for the elements that get instrumented (leaves only)
    #[serde(default = "default_target_selectors")]
    pub target_selectors: Vec<String>,

    /// Prefix of every tracking token
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,

    /// Length of the random id part of a token
    #[serde(default = "default_token_id_length")]
    pub token_id_length: usize,

    /// Budget for the whole decoration run
    #[serde(default = "default_render_timeout_ms")]
    pub render_timeout_ms: u64,

    /// Emit per-phase timings
    #[serde(default = "default_true")]
    pub performance_logging: bool,

    /// Optional JSONL file receiving phase events
    #[serde(default)]
    pub trace_path: Option<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            root_selector: default_root_selector(),
            target_selectors: default_target_selectors(),
            token_prefix: default_token_prefix(),
            token_id_length: default_token_id_length(),
            render_timeout_ms: default_render_timeout_ms(),
            performance_logging: true,
            trace_path: None,
        }
    }
}

impl MapperConfig {
    pub fn with_root_selector(mut self, selector: &str) -> Self {
        self.root_selector = selector.to_string();
        self
    }

    pub fn with_target_selectors(mut self, selectors: &[&str]) -> Self {
        self.target_selectors = selectors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_token_prefix(mut self, prefix: &str) -> Self {
        self.token_prefix = prefix.to_string();
        self
    }

    pub fn with_token_id_length(mut self, length: usize) -> Self {
        self.token_id_length = length;
        self
    }

    pub fn with_render_timeout_ms(mut self, ms: u64) -> Self {
        self.render_timeout_ms = ms;
        self
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// Reject values no phase can work with.
    pub fn validate(&self) -> Result<(), MapperError> {
        if self.token_id_length == 0 {
            return Err(MapperError::Configuration(
                "token_id_length must be at least 1".into(),
            ));
        }
        if self.token_prefix.is_empty() {
            return Err(MapperError::Configuration(
                "token_prefix must not be empty".into(),
            ));
        }
        if self.target_selectors.is_empty() {
            return Err(MapperError::Configuration(
                "at least one target selector is required".into(),
            ));
        }

        parse_selector(&self.root_selector)?;
        for selector in &self.target_selectors {
            parse_selector(selector)?;
        }
        Ok(())
    }
}

// Serde default helpers
fn default_root_selector() -> String { "main".to_string() }
fn default_token_prefix() -> String { "HASH_".to_string() }
fn default_token_id_length() -> usize { 8 }
fn default_render_timeout_ms() -> u64 { 10_000 }
fn default_true() -> bool { true }

fn default_target_selectors() -> Vec<String> {
    ["h1", "h2", "h3", "h4", "h5", "h6", "p", "img", "ul", "ol"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
