//! Page-session abstraction the crawler drives.
//!
//! A [`BrowserSession`] hands out [`PageHandle`]s, one per traversal branch.
//! The crawler never inspects how a page is rendered; it only navigates,
//! reads the rendered DOM, captures diagnostics, and closes the handle.
//! [`crate::client::HttpSession`] is the bundled implementation; a headless
//! browser backend plugs in by implementing the same two traits.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fpcrawl_core::{CrawlConfig, Viewport};
use rand::Rng;

use crate::error::ScraperError;

/// Browser context emulation applied to every page of a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextProfile {
    pub viewport: Viewport,
    pub locale: String,
    pub timezone: String,
    pub user_agent: String,
}

impl ContextProfile {
    /// Builds the profile from config, generating a user agent when none is set.
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            viewport: config.viewport,
            locale: config.locale.clone(),
            timezone: config.timezone.clone(),
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(random_desktop_user_agent),
        }
    }

    /// `Accept-Language` value for the profile locale, e.g.
    /// `"ru-RU,ru;q=0.9"` for `"ru-RU"`.
    #[must_use]
    pub fn accept_language(&self) -> String {
        match self.locale.split_once('-') {
            Some((lang, _)) if !lang.is_empty() => format!("{},{lang};q=0.9", self.locale),
            _ => self.locale.clone(),
        }
    }
}

/// A Windows desktop Chrome user agent with a major version in `100..=115`.
#[must_use]
pub fn random_desktop_user_agent() -> String {
    let major: u32 = rand::rng().random_range(100..=115);
    format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{major}.0.0.0 Safari/537.36"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    /// The city-selection cookie that scopes catalog prices and stock.
    #[must_use]
    pub fn selected_city(city: &str) -> Self {
        Self {
            name: "selectedCity".to_owned(),
            value: city.to_owned(),
        }
    }
}

/// Everything a page needs to load one URL.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub url: String,
    pub cookies: Vec<Cookie>,
    /// Upper bound for one load attempt and for its quiescence wait.
    pub timeout: Duration,
}

/// Source of page handles. One handle is opened per traversal branch.
pub trait BrowserSession: Send + Sync {
    type Page: PageHandle;

    /// Opens a fresh page configured with `profile`.
    fn new_page(
        &self,
        profile: &ContextProfile,
    ) -> impl Future<Output = Result<Self::Page, ScraperError>> + Send;
}

/// A single live page.
///
/// [`PageHandle::close`] consumes the handle, so a page is released at most
/// once; the crawler is responsible for calling it on every exit path.
pub trait PageHandle: Send + Sync {
    /// Loads `request.url` and waits until network activity settles.
    fn navigate(
        &mut self,
        request: &NavigationRequest,
    ) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// URL of the loaded document after redirects, or the last requested URL.
    fn url(&self) -> &str;

    /// Evaluates a script in the page and returns its JSON-serializable result.
    fn evaluate(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ScraperError>> + Send;

    /// Serialized rendered DOM of the current document.
    fn content(&self) -> impl Future<Output = Result<String, ScraperError>> + Send;

    /// Waits up to `timeout` for outstanding network/rendering work.
    fn wait_for_idle(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Captures a full-page diagnostic snapshot near `path`, returning the
    /// path actually written.
    fn screenshot(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<PathBuf, ScraperError>> + Send;

    /// Releases the page.
    fn close(self) -> impl Future<Output = ()> + Send;
}
