mod cli;

use mediagate::{
    config::{self, ConfigProvider},
    quirks::{ClientInfo, UserAgentQuirks},
    FileRequestHandler, InMemoryRepository,
};
use mediagate_av::check_tool;
use mediagate_core::OpenMode;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediagate=trace,mediagate_av=trace,mediagate_core=debug".to_string()
        } else {
            "mediagate=info,mediagate_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Describe {
            path,
            user_agent,
            json,
        } => rt.block_on(describe(
            &path,
            user_agent,
            json,
            cli.config.as_deref(),
            cli.catalog.as_deref(),
        )),
        Commands::Fetch { path, output } => rt.block_on(fetch(
            &path,
            output.as_deref(),
            cli.config.as_deref(),
            cli.catalog.as_deref(),
        )),
        Commands::Profiles => list_profiles(cli.config.as_deref()),
        Commands::Validate => validate_config(cli.config.as_deref()),
    }
}

fn build_handler(config_path: Option<&Path>, catalog: Option<&Path>) -> Result<FileRequestHandler> {
    let config = config::load_config_or_default(config_path)?;
    let repository = match catalog {
        Some(path) => InMemoryRepository::load(path)?,
        None => InMemoryRepository::new(),
    };

    Ok(
        FileRequestHandler::new(Arc::new(repository), Arc::new(config))
            .with_quirks(Arc::new(UserAgentQuirks::default())),
    )
}

async fn describe(
    path: &str,
    user_agent: Option<String>,
    json: bool,
    config_path: Option<&Path>,
    catalog: Option<&Path>,
) -> Result<()> {
    let handler = build_handler(config_path, catalog)?;
    let client = ClientInfo::new(None, user_agent);
    let info = handler
        .describe(path, &client)
        .await
        .with_context(|| format!("Failed to describe {path}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Delivery: {}", info.delivery);
    println!(
        "Content-Type: {}",
        info.content_type.as_deref().unwrap_or("(none)")
    );
    println!("Length: {}", info.length);
    if let Some(modified) = info.last_modified {
        println!("Last-Modified: {}", modified.to_rfc2822());
    }
    if !info.headers.is_empty() {
        println!("\nHeaders:");
        for (name, value) in info.headers.iter() {
            println!("  {name}: {value}");
        }
    }
    Ok(())
}

async fn fetch(
    path: &str,
    output: Option<&Path>,
    config_path: Option<&Path>,
    catalog: Option<&Path>,
) -> Result<()> {
    let handler = build_handler(config_path, catalog)?;
    let mut stream = handler
        .open(path, OpenMode::Read)
        .await
        .with_context(|| format!("Failed to open {path}"))?;

    let copied = match output {
        Some(out) => {
            let mut file = tokio::fs::File::create(out)
                .await
                .with_context(|| format!("Failed to create {:?}", out))?;
            stream.copy_to(&mut file).await
        }
        None => stream.copy_to(&mut tokio::io::stdout()).await,
    };
    let closed = stream.close().await;

    let bytes = copied?;
    closed?;
    tracing::info!("Fetched {} bytes from {}", bytes, stream.describe());
    Ok(())
}

fn list_profiles(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if config.transcoding.profiles.is_empty() {
        println!("No transcoding profiles configured");
        return Ok(());
    }
    if !config.transcoding.enabled {
        println!("Transcoding is disabled\n");
    }

    for profile in &config.transcoding.profiles {
        let tool = check_tool(&profile.command);
        let status = if tool.available { "OK" } else { "NOT FOUND" };
        let chunked = if profile.is_chunked(config.chunked_transfer()) {
            "chunked"
        } else {
            "unknown length"
        };
        println!(
            "{:<16} {:<20} {:<12} [{}] {}",
            profile.name, profile.mime_type, profile.command, status, chunked
        );
        if let Some(path) = tool.path {
            println!("{:<16} {}", "", path.display());
        }
    }
    Ok(())
}

fn validate_config(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let warnings = config::config_warnings(&config);

    println!("Configuration is valid");
    println!("  Transcoding profiles: {}", config.transcoding.profiles.len());
    println!(
        "  MIME mappings: {}",
        config.mappings.mimetype_contenttype.len()
    );
    println!("  DLNA profile rules: {}", config.mappings.dlna_profiles.len());

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}
