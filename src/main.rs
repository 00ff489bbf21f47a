use clap::Parser;
use dom_source_map::cli::commands::{cmd_embed, cmd_inspect, cmd_map};
use dom_source_map::cli::config::{Cli, Commands, build_mapper_config, load_config, log_filter};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Resolve mapper settings: CLI > config file > defaults
    let file = load_config(cli.config.as_deref());
    let config = build_mapper_config(
        &file,
        cli.root_selector.as_deref(),
        cli.token_prefix.as_deref(),
    );

    match cli.command {
        Commands::Embed {
            source,
            output,
            registry,
        } => {
            cmd_embed(
                &source,
                output.as_deref(),
                registry.as_deref(),
                &config,
                cli.verbose,
            )?;
        }
        Commands::Map {
            rendered,
            registry,
            output,
        } => {
            cmd_map(&rendered, &registry, output.as_deref(), &config, cli.verbose)?;
        }
        Commands::Inspect { source } => {
            cmd_inspect(&source, &config).await?;
        }
    }

    Ok(())
}
