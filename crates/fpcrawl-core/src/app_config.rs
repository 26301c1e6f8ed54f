use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Inclusive millisecond range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// A range that never sleeps.
    pub const ZERO: DelayRange = DelayRange {
        min_ms: 0,
        max_ms: 0,
    };

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }

    #[must_use]
    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Immutable crawl settings, built once at startup and handed to the crawler.
#[derive(Clone)]
pub struct CrawlConfig {
    pub env: Environment,
    pub log_level: String,
    pub catalogs_path: PathBuf,
    pub navigation_timeout_secs: u64,
    pub settle_delay: DelayRange,
    pub record_delay: DelayRange,
    pub page_delay: DelayRange,
    pub max_concurrent_pages: usize,
    pub max_pages: usize,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub snapshot_dir: PathBuf,
    /// `None` means a randomized desktop Chrome user agent is generated per run.
    pub user_agent: Option<String>,
    pub locale: String,
    pub timezone: String,
    pub viewport: Viewport,
    /// Vertical scroll applied after a seed page loads; `0` disables it.
    pub scroll_nudge_px: u32,
}

impl CrawlConfig {
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Upper bound for one page load including every retry: each attempt may
    /// take `navigation_timeout`, and attempt `n` is preceded by a
    /// `retry_backoff_base_secs * 2^(n-1)` pause.
    #[must_use]
    pub fn navigation_budget(&self) -> Duration {
        let attempts = u64::from(self.max_retries).saturating_add(1);
        let backoff_total = (0..self.max_retries).fold(0u64, |total, attempt| {
            total.saturating_add(
                self.retry_backoff_base_secs
                    .saturating_mul(1u64 << attempt.min(62)),
            )
        });
        Duration::from_secs(
            self.navigation_timeout_secs
                .saturating_mul(attempts)
                .saturating_add(backoff_total),
        )
    }

    /// Settings suitable for tests: no pacing delays, no retries, short timeout.
    #[must_use]
    pub fn for_tests(snapshot_dir: PathBuf) -> Self {
        Self {
            env: Environment::Test,
            log_level: "debug".to_string(),
            catalogs_path: PathBuf::from("./config/catalogs.yaml"),
            navigation_timeout_secs: 5,
            settle_delay: DelayRange::ZERO,
            record_delay: DelayRange::ZERO,
            page_delay: DelayRange::ZERO,
            max_concurrent_pages: 1,
            max_pages: 200,
            max_retries: 0,
            retry_backoff_base_secs: 0,
            snapshot_dir,
            user_agent: Some("fpcrawl-test/0.1".to_string()),
            locale: "ru-RU".to_string(),
            timezone: "Europe/Moscow".to_string(),
            viewport: Viewport::default(),
            scroll_nudge_px: 0,
        }
    }
}

impl std::fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("catalogs_path", &self.catalogs_path)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("settle_delay", &self.settle_delay)
            .field("record_delay", &self.record_delay)
            .field("page_delay", &self.page_delay)
            .field("max_concurrent_pages", &self.max_concurrent_pages)
            .field("max_pages", &self.max_pages)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("snapshot_dir", &self.snapshot_dir)
            .field(
                "user_agent",
                &self.user_agent.as_deref().unwrap_or("[randomized]"),
            )
            .field("locale", &self.locale)
            .field("timezone", &self.timezone)
            .field(
                "viewport",
                &format_args!("{}x{}", self.viewport.width, self.viewport.height),
            )
            .field("scroll_nudge_px", &self.scroll_nudge_px)
            .finish()
    }
}
