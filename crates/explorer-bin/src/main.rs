use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use explorer_core::config::ExplorerConfig;
use explorer_core::FileExplorer;
use storage_local::LocalStorage;

mod console;
mod shell;

use console::{render_listing, ConsoleNotifier};

#[derive(Parser, Debug)]
#[command(name = "file-explorer")]
#[command(about = "Browse, read and write files on external storage")]
#[command(version)]
struct Cli {
    /// Directory to treat as the external storage root
    #[arg(long, env = "EXPLORER_ROOT", global = true)]
    root: Option<PathBuf>,

    /// Create the storage root if it does not exist
    #[arg(long, global = true)]
    create_root: bool,

    /// Path to config file
    #[arg(long, env = "EXPLORER_CONFIG_PATH", global = true)]
    config_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "EXPLORER_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a directory (the storage root by default)
    Ls {
        /// Directory name below the root, or an absolute location
        location: Option<String>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a file under the storage root
    Write {
        name: String,
        content: String,

        /// Append as a new line instead of overwriting
        #[arg(long)]
        append: bool,
    },
    /// Print a file under the storage root
    Read { name: String },
    /// Interactive browsing shell (default)
    Shell,
    /// Write the effective root settings to the config file
    Init,
}

/// Config file contents with the command line applied on top
fn effective_config(cli: &Cli, config_path: &Path) -> Result<ExplorerConfig> {
    let mut config = if config_path.exists() {
        info!("loading config from {}", config_path.display());
        ExplorerConfig::load(config_path)?
    } else {
        ExplorerConfig::default()
    };

    // CLI args override config file
    if let Some(root) = &cli.root {
        config.storage_root = Some(root.clone());
    }
    if cli.create_root {
        config.create_root = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config_path
        .clone()
        .unwrap_or_else(ExplorerConfig::default_path);

    let config = effective_config(&cli, &config_path)?;

    if matches!(cli.command, Some(Commands::Init)) {
        config.save(&config_path)?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    let storage_root = config.resolved_root();
    info!("using storage root {}", storage_root.display());

    let storage = LocalStorage::new(storage_root).with_create_root(config.create_root);
    let mut explorer = FileExplorer::new(Arc::new(storage), Box::new(ConsoleNotifier));
    let root_location = explorer
        .start()
        .await
        .context("file system not initiated")?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Ls { location, json } => {
            let listing = match location {
                Some(arg) => {
                    let target = shell::cd_target(&arg, None, &root_location);
                    explorer.change_path(&target).await?
                }
                None => explorer.open_explorer().await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{}", render_listing(&listing));
            }
        }
        Commands::Write {
            name,
            content,
            append,
        } => {
            let report = explorer.write_file(&name, &content, append).await?;
            println!("{} ({} bytes)", report.location, report.bytes_written);
        }
        Commands::Read { name } => {
            let content = explorer.read_file(&name).await?;
            println!("{}", content);
        }
        Commands::Shell => shell::run(&mut explorer).await?,
        Commands::Init => {}
    }

    Ok(())
}
