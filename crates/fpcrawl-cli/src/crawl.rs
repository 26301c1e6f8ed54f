//! Command handlers for `crawl` and `catalogs`.
//!
//! Configuration problems (unreadable catalogs file, unknown catalog name,
//! malformed `--url`) fail the command. Page-level failures never do: they
//! are logged by the crawler and reported in the closing summary.

use std::path::PathBuf;

use fpcrawl_core::{load_catalogs, CatalogTarget, CatalogsFile, CrawlConfig};
use fpcrawl_scraper::{CatalogCrawler, CrawlSeed, HttpSession};
use tokio_util::sync::CancellationToken;

use crate::output::JsonLinesSink;

#[derive(Debug, Default)]
pub(crate) struct CrawlArgs {
    pub catalog: Option<String>,
    pub urls: Vec<String>,
    pub city: Option<String>,
    pub output: Option<PathBuf>,
    pub max_pages: Option<usize>,
    pub dry_run: bool,
}

/// Pick the crawl targets.
///
/// `--url` values take precedence and bypass the catalogs file entirely.
/// Otherwise `catalog_filter` selects one catalog by name, or all catalogs are
/// crawled when it is `None`.
pub(crate) fn resolve_targets(
    catalogs: Option<&CatalogsFile>,
    catalog_filter: Option<&str>,
    urls: &[String],
    city: Option<&str>,
) -> anyhow::Result<Vec<CatalogTarget>> {
    if !urls.is_empty() {
        return urls
            .iter()
            .map(|url| {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    anyhow::bail!("--url '{url}' must be an absolute http(s) URL");
                }
                Ok(CatalogTarget::from_url(url, city.map(str::to_owned)))
            })
            .collect();
    }

    let Some(catalogs) = catalogs else {
        anyhow::bail!("no catalogs file loaded and no --url given");
    };

    match catalog_filter {
        Some(name) => {
            let target = catalogs.find(name).ok_or_else(|| {
                let known: Vec<&str> = catalogs.catalogs.iter().map(|c| c.name.as_str()).collect();
                anyhow::anyhow!(
                    "catalog '{name}' not found; known catalogs: [{}]",
                    known.join(", ")
                )
            })?;
            Ok(vec![target.clone()])
        }
        None => Ok(catalogs.catalogs.clone()),
    }
}

/// Run a crawl and stream records to stdout or `args.output`.
///
/// # Errors
///
/// Returns an error if targets cannot be resolved, the HTTP session cannot be
/// built, or the output file cannot be created or flushed.
pub(crate) async fn run_crawl(mut config: CrawlConfig, args: CrawlArgs) -> anyhow::Result<()> {
    let catalogs = if args.urls.is_empty() {
        Some(load_catalogs(&config.catalogs_path)?)
    } else {
        None
    };
    let targets = resolve_targets(
        catalogs.as_ref(),
        args.catalog.as_deref(),
        &args.urls,
        args.city.as_deref(),
    )?;

    if targets.is_empty() {
        println!("no catalogs configured; nothing to crawl");
        return Ok(());
    }

    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }

    if args.dry_run {
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        println!(
            "dry-run: would crawl {} catalogs (max {} pages): [{}]",
            targets.len(),
            config.max_pages,
            names.join(", ")
        );
        return Ok(());
    }

    let sink = match &args.output {
        Some(path) => JsonLinesSink::create(path).await?,
        None => JsonLinesSink::stdout(),
    };
    let session = HttpSession::from_config(&config)?;
    let crawler = CatalogCrawler::new(session, config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing in-flight pages");
            trigger.cancel();
        }
    });

    let seeds: Vec<CrawlSeed> = targets.iter().map(CrawlSeed::from).collect();
    let summary = crawler.crawl(seeds, &sink, &cancel).await;
    sink.flush().await?;

    if summary.failed_pages > 0 {
        tracing::warn!(
            failed_pages = summary.failed_pages,
            pages = summary.pages_visited,
            "some pages failed during the crawl"
        );
    }
    eprintln!(
        "crawled {} pages: {} records, {} skipped, {} empty, {} failed{}",
        summary.pages_visited,
        summary.records_emitted,
        summary.records_skipped,
        summary.empty_pages,
        summary.failed_pages,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}

/// Print the configured catalogs, one per line.
///
/// # Errors
///
/// Returns an error if the catalogs file cannot be loaded.
pub(crate) fn list_catalogs(config: &CrawlConfig) -> anyhow::Result<()> {
    let catalogs = load_catalogs(&config.catalogs_path)?;
    for target in &catalogs.catalogs {
        println!(
            "{}\t{}\t{}",
            target.name,
            target.url,
            target.city.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
