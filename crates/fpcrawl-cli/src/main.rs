mod crawl;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fpcrawl")]
#[command(about = "Fix Price catalog crawler")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Crawl catalog pages and emit product records as JSON Lines
    Crawl {
        /// Crawl a single catalog from the catalogs file (by name)
        #[arg(long)]
        catalog: Option<String>,

        /// Crawl these URLs instead of the catalogs file
        #[arg(long = "url")]
        urls: Vec<String>,

        /// City cookie applied to `--url` targets
        #[arg(long, requires = "urls")]
        city: Option<String>,

        /// Write records to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Override the configured page limit
        #[arg(long)]
        max_pages: Option<usize>,

        /// Print the resolved targets and exit without crawling
        #[arg(long)]
        dry_run: bool,
    },
    /// List the configured catalogs
    Catalogs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = fpcrawl_core::load_crawl_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Crawl {
            catalog,
            urls,
            city,
            output,
            max_pages,
            dry_run,
        }) => {
            let args = crawl::CrawlArgs {
                catalog,
                urls,
                city,
                output,
                max_pages,
                dry_run,
            };
            crawl::run_crawl(config, args).await?;
        }
        Some(Commands::Catalogs) => crawl::list_catalogs(&config)?,
        None => println!("fpcrawl: run `fpcrawl crawl` or `fpcrawl --help`"),
    }

    Ok(())
}
