use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "blobfabric")]
#[command(about = "Inspect and modify blob storage through a configured sink chain", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "BLOBFABRIC_CONFIG", default_value = "blobfabric.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List blobs in a folder
    Ls {
        /// Folder to list
        #[arg(default_value = "/")]
        folder: String,

        /// Descend into subfolders
        #[arg(short, long)]
        recursive: bool,

        /// Only list blobs whose name starts with this prefix
        #[arg(short, long)]
        prefix: Option<String>,

        /// Stop after this many entries
        #[arg(short, long)]
        max: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a blob's content to stdout
    Cat {
        /// Blob path
        path: String,
    },

    /// Write a blob from a file or stdin
    Put {
        /// Blob path
        path: String,

        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<String>,

        /// Append to existing content
        #[arg(short, long)]
        append: bool,
    },

    /// Delete blobs or folders
    Rm {
        /// Blob or folder paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Check whether blobs exist
    Exists {
        /// Blob paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Show blob metadata
    Stat {
        /// Blob path
        path: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let storage = commands::open_storage(&cli.config)?;

    match cli.command {
        Commands::Ls {
            folder,
            recursive,
            prefix,
            max,
            format,
        } => {
            commands::ls::run(storage.as_ref(), &folder, recursive, prefix, max, &format).await?;
        }
        Commands::Cat { path } => {
            commands::cat::run(storage.as_ref(), &path).await?;
        }
        Commands::Put { path, file, append } => {
            commands::put::run(storage.as_ref(), &path, file.as_deref(), append).await?;
        }
        Commands::Rm { paths } => {
            commands::rm::run(storage.as_ref(), &paths).await?;
        }
        Commands::Exists { paths } => {
            let all_found = commands::exists::run(storage.as_ref(), &paths).await?;
            if !all_found {
                std::process::exit(1);
            }
        }
        Commands::Stat { path, format } => {
            commands::stat::run(storage.as_ref(), &path, &format).await?;
        }
    }

    Ok(())
}
