use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::embed::embedder::embed_markers;
use crate::embed::registry::{PathRegistry, TokenTable};
use crate::mapping::path_mapper::map_page_paths;
use crate::pipeline::config::MapperConfig;
use crate::pipeline::error::MapperError;
use crate::pipeline::init::initialize_session;
use crate::render::decorator::DecorationOptions;

/// On-disk form of an embedding pass, consumed by `map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub root_selector: String,
    pub token_prefix: String,
    pub token_id_length: usize,
    pub tokens: TokenTable,
    pub source_paths: PathRegistry,
}

// ============================================================================
// embed subcommand
// ============================================================================

pub fn cmd_embed(
    source: &str,
    output: Option<&str>,
    registry: Option<&str>,
    config: &MapperConfig,
    verbose: u8,
) -> Result<usize, MapperError> {
    config.validate()?;
    let markup = read_file(source)?;
    let embedded = embed_markers(&markup, config)?;

    if verbose > 0 {
        eprintln!("Embedded {} tokens from {}", embedded.tokens.len(), source);
    }

    if let Some(path) = registry {
        let file = RegistryFile {
            root_selector: config.root_selector.clone(),
            token_prefix: config.token_prefix.clone(),
            token_id_length: config.token_id_length,
            tokens: embedded.tokens.clone(),
            source_paths: embedded.source_paths.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| MapperError::Json {
            context: "registry file".into(),
            source: e,
        })?;
        write_file(path, &json)?;
    }

    emit(output, &embedded.marked_html)?;
    Ok(embedded.tokens.len())
}

// ============================================================================
// map subcommand
// ============================================================================

pub fn cmd_map(
    rendered: &str,
    registry: &str,
    output: Option<&str>,
    config: &MapperConfig,
    verbose: u8,
) -> Result<usize, MapperError> {
    let registry = load_registry(registry)?;

    // Paths only compare under the conventions they were recorded with.
    let mut config = config.clone();
    config.root_selector = registry.root_selector.clone();
    config.token_prefix = registry.token_prefix.clone();
    config.token_id_length = registry.token_id_length;
    config.validate()?;

    let rendered_doc = Html::parse_document(&read_file(rendered)?);
    let page_paths = map_page_paths(&rendered_doc, &registry.source_paths, &config)?;

    if verbose > 0 {
        eprintln!(
            "Mapped {} of {} tokens",
            page_paths.len(),
            registry.source_paths.len()
        );
    }

    let json = serde_json::to_string_pretty(&page_paths).map_err(|e| MapperError::Json {
        context: "page-path registry".into(),
        source: e,
    })?;
    emit(output, &json)?;
    Ok(page_paths.len())
}

pub fn load_registry(path: &str) -> Result<RegistryFile, MapperError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| MapperError::Json {
        context: format!("registry file {}", path),
        source: e,
    })
}

// ============================================================================
// inspect subcommand
// ============================================================================

pub async fn cmd_inspect(source: &str, config: &MapperConfig) -> Result<Vec<String>, MapperError> {
    let markup = read_file(source)?;
    let session = initialize_session(&markup, config, Some(DecorationOptions::identity())).await?;

    let lines: Vec<String> = session
        .mapped_elements()
        .iter()
        .map(|pair| format!("{}  {} -> {}", pair.token, pair.source.path, pair.page.path))
        .collect();

    for line in &lines {
        println!("{}", line);
    }
    println!(
        "{} of {} tracked elements mapped",
        lines.len(),
        session.service().source_paths().len()
    );
    Ok(lines)
}

// ============================================================================
// Helpers
// ============================================================================

fn read_file(path: &str) -> Result<String, MapperError> {
    std::fs::read_to_string(path).map_err(|e| MapperError::Io {
        context: format!("reading {}", path),
        source: e,
    })
}

fn write_file(path: &str, content: &str) -> Result<(), MapperError> {
    std::fs::write(path, content).map_err(|e| MapperError::Io {
        context: format!("writing {}", path),
        source: e,
    })
}

/// Write to `output` when given, stdout otherwise.
fn emit(output: Option<&str>, content: &str) -> Result<(), MapperError> {
    match output {
        Some(path) => write_file(path, content),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}
