//! A single page visit: load, extract, emit, paginate.

use std::fmt;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use super::{CatalogCrawler, PageTask};
use crate::error::ScraperError;
use crate::extract::extract_listings;
use crate::normalize::normalize_listing;
use crate::pagination::{inspect_pagination, NextPage, Terminal};
use crate::rate_limit::pace;
use crate::session::{BrowserSession, Cookie, NavigationRequest, PageHandle};
use crate::sink::RecordSink;

/// Lifecycle of a branch's page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    Loading,
    Extracting,
    Emitting,
    Paginating,
    Closed,
    ErrorClosed,
}

/// How a branch ended. The page is released on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchExit {
    /// All listings handled; `next` holds the follow-up target, if any.
    Closed,
    /// The page loaded but carried no listings. Pagination is not consulted.
    Empty,
    /// Navigation, extraction, pagination, or the sink failed.
    ErrorClosed,
    /// Stopped at a pacing point after cancellation.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct BranchOutcome {
    pub url: String,
    pub page_index: usize,
    pub exit: BranchExit,
    pub records: usize,
    pub skipped: usize,
    pub next: Option<String>,
    /// Where the page ended up when that differs from `url` (redirects).
    pub landed_url: Option<String>,
    pub(super) cookies: Vec<Cookie>,
}

#[derive(Debug, Clone, Copy)]
enum SnapshotKind {
    NoProducts,
    Error,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::NoProducts => write!(f, "no-products"),
            SnapshotKind::Error => write!(f, "error"),
        }
    }
}

/// Where a successfully loaded page leaves the branch.
enum PageEnd {
    Next(String),
    Last,
    Empty,
    Cancelled,
}

#[derive(Default)]
struct Tally {
    records: usize,
    skipped: usize,
}

impl<B: BrowserSession> CatalogCrawler<B> {
    /// Runs one branch to completion.
    ///
    /// Returns `None` if cancellation arrived during the inter-page delay,
    /// before any page was opened.
    pub(super) async fn run_branch<S: RecordSink>(
        &self,
        task: PageTask,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Option<BranchOutcome> {
        if task.page_index > 0 && !pace(self.config.page_delay, cancel).await {
            tracing::debug!(url = %task.url, "crawl cancelled before branch start");
            return None;
        }

        tracing::info!(url = %task.url, page = task.page_index, "branch started");

        let mut outcome = BranchOutcome {
            url: task.url.clone(),
            page_index: task.page_index,
            exit: BranchExit::Closed,
            records: 0,
            skipped: 0,
            next: None,
            landed_url: None,
            cookies: task.cookies.clone(),
        };

        let mut page = match self.session.new_page(&self.profile).await {
            Ok(page) => page,
            Err(err) => {
                tracing::error!(url = %task.url, error = %err, "could not open page");
                outcome.exit = BranchExit::ErrorClosed;
                return Some(outcome);
            }
        };

        let mut tally = Tally::default();
        let result = self
            .visit(&mut page, &task, sink, cancel, &mut tally)
            .await;
        outcome.records = tally.records;
        outcome.skipped = tally.skipped;

        match result {
            Ok(PageEnd::Next(next)) => outcome.next = Some(next),
            Ok(PageEnd::Last) => {}
            Ok(PageEnd::Empty) => outcome.exit = BranchExit::Empty,
            Ok(PageEnd::Cancelled) => {
                tracing::info!(url = %task.url, records = tally.records, "branch cancelled");
                outcome.exit = BranchExit::Cancelled;
            }
            Err(err) => {
                tracing::error!(
                    url = %task.url,
                    page = task.page_index,
                    records = tally.records,
                    error = %err,
                    "branch failed"
                );
                self.capture_snapshot(&page, SnapshotKind::Error, task.page_index)
                    .await;
                outcome.exit = BranchExit::ErrorClosed;
            }
        }

        let landed = page.url();
        if !landed.is_empty() && landed != task.url {
            outcome.landed_url = Some(landed.to_owned());
        }

        transition(
            &task.url,
            if outcome.exit == BranchExit::ErrorClosed {
                BranchState::ErrorClosed
            } else {
                BranchState::Closed
            },
        );
        page.close().await;
        Some(outcome)
    }

    async fn visit<S: RecordSink>(
        &self,
        page: &mut B::Page,
        task: &PageTask,
        sink: &S,
        cancel: &CancellationToken,
        tally: &mut Tally,
    ) -> Result<PageEnd, ScraperError> {
        transition(&task.url, BranchState::Loading);
        let request = NavigationRequest {
            url: task.url.clone(),
            cookies: task.cookies.clone(),
            timeout: self.config.navigation_timeout(),
        };
        // `request.timeout` bounds each attempt; the budget bounds all of them.
        let budget = self.config.navigation_budget();
        tokio::time::timeout(budget, page.navigate(&request))
            .await
            .map_err(|_| ScraperError::NavigationTimeout {
                url: task.url.clone(),
                timeout_secs: budget.as_secs(),
            })??;
        page.wait_for_idle(request.timeout).await?;

        if task.is_seed && self.config.scroll_nudge_px > 0 {
            let script = format!("window.scrollBy(0, {})", self.config.scroll_nudge_px);
            if let Err(err) = page.evaluate(&script).await {
                tracing::debug!(url = %task.url, error = %err, "scroll nudge skipped");
            }
        }

        if !pace(self.config.settle_delay, cancel).await {
            return Ok(PageEnd::Cancelled);
        }

        transition(&task.url, BranchState::Extracting);
        let page_url = page.url().to_owned();
        let listings = extract_listings(&page.content().await?);
        if listings.is_empty() {
            tracing::warn!(url = %page_url, "no products found on page");
            self.capture_snapshot(page, SnapshotKind::NoProducts, task.page_index)
                .await;
            return Ok(PageEnd::Empty);
        }

        transition(&task.url, BranchState::Emitting);
        for (i, listing) in listings.into_iter().enumerate() {
            if i > 0 && !pace(self.config.record_delay, cancel).await {
                return Ok(PageEnd::Cancelled);
            }
            match normalize_listing(listing, &page_url) {
                Ok(record) => {
                    sink.accept(record).await?;
                    tally.records += 1;
                }
                Err(err) if err.is_record_level() => {
                    tracing::warn!(url = %page_url, error = %err, "skipping listing");
                    tally.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        tracing::info!(
            url = %page_url,
            page = task.page_index,
            records = tally.records,
            skipped = tally.skipped,
            "page records emitted"
        );

        transition(&task.url, BranchState::Paginating);
        let cursor = inspect_pagination(&page.content().await?, &page_url);
        match cursor.next {
            NextPage::Target(next) => {
                tracing::debug!(url = %page_url, next = %next, "next page queued");
                Ok(PageEnd::Next(next))
            }
            NextPage::Terminal(Terminal::Unresolvable { reference, reason }) => {
                tracing::warn!(
                    url = %page_url,
                    reference = %reference,
                    reason = %reason,
                    "next page reference unresolvable; ending branch"
                );
                Ok(PageEnd::Last)
            }
            NextPage::Terminal(terminal) => {
                tracing::debug!(url = %page_url, terminal = ?terminal, "last page reached");
                Ok(PageEnd::Last)
            }
        }
    }

    fn snapshot_path(&self, kind: SnapshotKind, page_index: usize) -> PathBuf {
        self.config
            .snapshot_dir
            .join(format!("{kind}-{}-{page_index}.png", self.crawl_id))
    }

    /// Best-effort diagnostic capture; failures are logged only.
    async fn capture_snapshot(&self, page: &B::Page, kind: SnapshotKind, page_index: usize) {
        let path = self.snapshot_path(kind, page_index);
        match page.screenshot(&path).await {
            Ok(written) => {
                tracing::info!(path = %written.display(), kind = %kind, "diagnostic snapshot saved");
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "diagnostic snapshot failed");
            }
        }
    }
}

fn transition(url: &str, state: BranchState) {
    tracing::debug!(url, state = ?state, "branch state");
}
