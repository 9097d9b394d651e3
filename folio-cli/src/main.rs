//! # folio CLI
//!
//! Command-line driver for resolving a folio site's posts and tabs.

mod commands;
mod site;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "site.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Site directory to read from (defaults to the config file's directory)
    #[arg(long, conflicts_with = "url")]
    root: Option<PathBuf>,

    /// Base URL to fetch the site from instead of the local disk
    #[arg(long, env = "FOLIO_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the posts index for a language
    Posts {
        /// Requested language (code or label)
        #[arg(long, default_value = "en")]
        lang: String,

        /// Print the eager map without waiting for front matter
        #[arg(long)]
        eager: bool,

        /// Drop entries marked as drafts
        #[arg(long)]
        published: bool,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve the tabs config for a language
    Tabs {
        /// Requested language (code or label)
        #[arg(long, default_value = "en")]
        lang: String,

        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },

    /// List languages declared by the posts index
    Languages,

    /// Report the shape of a local index file
    Classify {
        /// YAML file to inspect
        file: PathBuf,
    },

    /// Print canonical codes for language labels
    Normalize {
        /// Labels such as "English" or "zh_TW"
        #[arg(required = true)]
        labels: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries JSON, so logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let target = site::SiteTarget {
        config: cli.config,
        root: cli.root,
        url: cli.url,
    };

    match cli.command {
        Commands::Posts {
            lang,
            eager,
            published,
            pretty,
        } => {
            let opts = commands::PostsOptions {
                eager,
                published,
                pretty,
            };
            commands::show_posts(&target, &lang, opts).await
        }
        Commands::Tabs { lang, pretty } => commands::show_tabs(&target, &lang, pretty).await,
        Commands::Languages => commands::show_languages(&target).await,
        Commands::Classify { file } => commands::classify_file(&file),
        Commands::Normalize { labels } => {
            commands::normalize_labels(&labels);
            Ok(())
        }
    }
}
