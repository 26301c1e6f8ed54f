//! Crawl session orchestration.
//!
//! A crawl starts from one or more seed catalog URLs. Each page visit is a
//! *branch*: load, extract, emit, then decide on a next page. Next pages are
//! pushed onto a work queue rather than followed recursively, so a long
//! pagination chain never grows the call stack. Branch failures are contained
//! here: they are logged, snapshotted, and counted, and the crawl moves on.

mod branch;

use std::collections::{HashSet, VecDeque};

use fpcrawl_core::{CatalogTarget, CrawlConfig};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::session::{BrowserSession, ContextProfile, Cookie};
use crate::sink::RecordSink;

pub use branch::{BranchExit, BranchOutcome, BranchState};

/// A starting URL and the cookies every page of its traversal carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSeed {
    pub url: String,
    pub cookies: Vec<Cookie>,
}

impl CrawlSeed {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookies: Vec::new(),
        }
    }
}

impl From<&CatalogTarget> for CrawlSeed {
    fn from(target: &CatalogTarget) -> Self {
        Self {
            url: target.url.clone(),
            cookies: target
                .city
                .as_deref()
                .map(Cookie::selected_city)
                .into_iter()
                .collect(),
        }
    }
}

/// Totals for a finished (or cancelled) crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Branches started, failed ones included.
    pub pages_visited: usize,
    pub records_emitted: usize,
    /// Listings dropped because their text could not be normalized.
    pub records_skipped: usize,
    pub empty_pages: usize,
    pub failed_pages: usize,
    pub cancelled: bool,
}

impl CrawlSummary {
    fn absorb(&mut self, outcome: &BranchOutcome) {
        self.pages_visited += 1;
        self.records_emitted += outcome.records;
        self.records_skipped += outcome.skipped;
        match outcome.exit {
            BranchExit::Empty => self.empty_pages += 1,
            BranchExit::ErrorClosed => self.failed_pages += 1,
            BranchExit::Closed | BranchExit::Cancelled => {}
        }
    }
}

/// One queued page visit.
#[derive(Debug, Clone)]
struct PageTask {
    url: String,
    cookies: Vec<Cookie>,
    /// Position in visit order; `0` is the first page of the crawl.
    page_index: usize,
    is_seed: bool,
}

/// Drives branches over a [`BrowserSession`] with an immutable configuration.
pub struct CatalogCrawler<B> {
    session: B,
    config: CrawlConfig,
    profile: ContextProfile,
    crawl_id: Uuid,
}

impl<B: BrowserSession> CatalogCrawler<B> {
    /// Creates a crawler; the context profile (including a randomized user
    /// agent when none is configured) is fixed for the crawler's lifetime.
    #[must_use]
    pub fn new(session: B, config: CrawlConfig) -> Self {
        let profile = ContextProfile::from_config(&config);
        Self {
            session,
            config,
            profile,
            crawl_id: Uuid::new_v4(),
        }
    }

    /// Identifier embedded in diagnostic snapshot file names.
    #[must_use]
    pub fn crawl_id(&self) -> Uuid {
        self.crawl_id
    }

    /// Crawls every seed and the pages reachable through their pagination.
    ///
    /// Never fails: per-page errors end only their own branch and are
    /// reflected in the returned [`CrawlSummary`]. When `cancel` fires, no
    /// further branch starts and in-flight branches release their pages
    /// before this returns.
    pub async fn crawl<S: RecordSink>(
        &self,
        seeds: Vec<CrawlSeed>,
        sink: &S,
        cancel: &CancellationToken,
    ) -> CrawlSummary {
        let mut queue: VecDeque<PageTask> = seeds
            .into_iter()
            .map(|seed| PageTask {
                url: seed.url,
                cookies: seed.cookies,
                page_index: 0,
                is_seed: true,
            })
            .collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut in_flight = FuturesUnordered::new();
        let mut summary = CrawlSummary::default();
        let mut started = 0usize;
        let limit = self.config.max_concurrent_pages.max(1);

        tracing::info!(
            crawl_id = %self.crawl_id,
            seeds = queue.len(),
            user_agent = %self.profile.user_agent,
            "crawl started"
        );

        loop {
            while in_flight.len() < limit && !cancel.is_cancelled() {
                let Some(mut task) = queue.pop_front() else {
                    break;
                };
                if started >= self.config.max_pages {
                    tracing::warn!(
                        max_pages = self.config.max_pages,
                        dropped = queue.len() + 1,
                        "page limit reached; remaining targets dropped"
                    );
                    queue.clear();
                    break;
                }
                if !visited.insert(task.url.clone()) {
                    tracing::warn!(url = %task.url, "target already visited in this crawl; skipping");
                    continue;
                }
                task.page_index = started;
                started += 1;
                in_flight.push(self.run_branch(task, sink, cancel));
            }

            let Some(result) = in_flight.next().await else {
                break;
            };
            let Some(outcome) = result else {
                continue;
            };
            summary.absorb(&outcome);
            if let Some(landed) = outcome.landed_url {
                visited.insert(landed);
            }

            if let Some(next) = outcome.next {
                queue.push_back(PageTask {
                    url: next,
                    cookies: outcome.cookies,
                    page_index: 0,
                    is_seed: false,
                });
            }
        }

        summary.cancelled = cancel.is_cancelled();
        tracing::info!(
            crawl_id = %self.crawl_id,
            pages = summary.pages_visited,
            records = summary.records_emitted,
            skipped = summary.records_skipped,
            empty = summary.empty_pages,
            failed = summary.failed_pages,
            cancelled = summary.cancelled,
            "crawl finished"
        );
        summary
    }
}

#[cfg(test)]
#[path = "crawler_test.rs"]
mod tests;
