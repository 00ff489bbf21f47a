use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::pipeline::config::MapperConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "dom-source-map",
    version,
    about = "Map rendered HTML elements back to their source elements"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Root element selector (overrides the config file)
    #[arg(long, global = true)]
    pub root_selector: Option<String>,

    /// Token prefix (overrides the config file)
    #[arg(long, global = true)]
    pub token_prefix: Option<String>,

    /// Path to config file (default: dom-source-map.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed tracking tokens into a source document
    Embed {
        /// Source HTML file
        #[arg(long)]
        source: String,

        /// Where to write the marked HTML (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Where to write the token registry JSON
        #[arg(long)]
        registry: Option<String>,
    },

    /// Locate embedded tokens in an externally rendered document
    Map {
        /// Rendered HTML file
        #[arg(long)]
        rendered: String,

        /// Token registry JSON written by `embed`
        #[arg(long)]
        registry: String,

        /// Where to write the page-path registry JSON (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the full pipeline with an identity renderer and list mapped pairs
    Inspect {
        /// Source HTML file
        #[arg(long)]
        source: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `dom-source-map.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mapper: MapperConfig,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("dom-source-map.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// CLI flags win over the config file, which wins over defaults.
pub fn build_mapper_config(
    file: &AppConfig,
    root_selector: Option<&str>,
    token_prefix: Option<&str>,
) -> MapperConfig {
    let mut config = file.mapper.clone();
    if let Some(selector) = root_selector {
        config.root_selector = selector.to_string();
    }
    if let Some(prefix) = token_prefix {
        config.token_prefix = prefix.to_string();
    }
    config
}

/// `tracing` filter directive for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
