//! CLI entry point for postmill

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "postmill")]
#[command(version)]
#[command(about = "Build a static blog manifest and render its posts", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Render posts with the minimal renderer instead of the Markdown converter
    #[arg(long, global = true)]
    no_converter: bool,

    /// Skip HTML sanitizing of converted posts
    #[arg(long, global = true)]
    no_sanitizer: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the output directory and the blog manifest
    #[command(alias = "b")]
    Build,

    /// Remove the output directory
    Clean,

    /// Render the blog page from the build output
    #[command(alias = "r")]
    Render {
        /// Fetch the manifest and posts from this origin instead of the output directory
        #[arg(long)]
        origin: Option<String>,

        /// Write the page here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the posts a build would publish
    List,

    /// Build, then serve the output with the blog page rendered per request
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Rebuild when sources change
        #[arg(short, long)]
        watch: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postmill=debug,info"
    } else {
        "postmill=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    let mut site = postmill::Site::new(&base_dir)?;
    if cli.no_converter {
        site.config.render.converter = false;
    }
    if cli.no_sanitizer {
        site.config.render.sanitizer = false;
    }

    match cli.command {
        Commands::Build => {
            tracing::info!("Building {:?}", site.base_dir);
            let report = site.build()?;
            println!("Build completed. Output: {}", report.output_dir.display());
        }

        Commands::Clean => {
            tracing::info!("Cleaning output folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Render { origin, out } => {
            postmill::commands::render::run(
                &site,
                &site.capabilities(),
                origin.as_deref(),
                out.as_deref(),
            )
            .await?;
        }

        Commands::List => {
            postmill::commands::list::run(&site)?;
        }

        Commands::Serve { port, ip, watch } => {
            // Build first
            let report = site.build()?;
            println!("Build completed. Output: {}", report.output_dir.display());

            tracing::info!("Starting server at http://{}:{}", ip, port);
            postmill::server::start(&site, site.capabilities(), &ip, port, watch).await?;
        }

        Commands::Version => {
            println!("postmill version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
