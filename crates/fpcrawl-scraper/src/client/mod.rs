//! HTTP-backed page session for server-rendered catalog pages.
//!
//! [`HttpSession`] implements [`BrowserSession`] with a plain `reqwest`
//! client: navigation is a single GET (with the context profile's headers and
//! cookies) and the "rendered DOM" is the response body. There is no script
//! engine, so [`PageHandle::evaluate`] reports [`ScraperError::Unsupported`]
//! and diagnostic snapshots are saved as HTML rather than images.

mod origin;

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;
use crate::session::{BrowserSession, ContextProfile, Cookie, NavigationRequest, PageHandle};

pub use origin::extract_origin;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Session handing out [`HttpPage`]s that share one connection pool.
///
/// Transient navigation errors (429, network failures, timeouts) are retried
/// with exponential backoff up to `max_retries` additional attempts.
pub struct HttpSession {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl HttpSession {
    /// Creates a session with the given overall request timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates a session from the crawl configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpSession::new`].
    pub fn from_config(config: &fpcrawl_core::CrawlConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.navigation_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }
}

impl BrowserSession for HttpSession {
    type Page = HttpPage;

    async fn new_page(&self, profile: &ContextProfile) -> Result<HttpPage, ScraperError> {
        Ok(HttpPage {
            client: self.client.clone(),
            profile: profile.clone(),
            max_retries: self.max_retries,
            backoff_base_secs: self.backoff_base_secs,
            url: String::new(),
            body: None,
        })
    }
}

/// A page whose document is the body of the last successful GET.
pub struct HttpPage {
    client: Client,
    profile: ContextProfile,
    max_retries: u32,
    backoff_base_secs: u64,
    url: String,
    body: Option<String>,
}

impl PageHandle for HttpPage {
    async fn navigate(&mut self, request: &NavigationRequest) -> Result<(), ScraperError> {
        request.url.clone_into(&mut self.url);
        self.body = None;

        let client = &self.client;
        let profile = &self.profile;
        let cookies = cookie_header(&request.cookies);
        let cookies = cookies.as_deref();
        let referer = extract_origin(&request.url);
        let referer = referer.as_str();
        let url = request.url.as_str();
        let timeout = request.timeout;

        let (final_url, body) =
            retry_with_backoff(self.max_retries, self.backoff_base_secs, move || {
                fetch_document(client, profile, url, cookies, referer, timeout)
            })
            .await?;

        tracing::debug!(
            url = %final_url,
            bytes = body.len(),
            "page document loaded"
        );
        self.url = final_url;
        self.body = Some(body);
        Ok(())
    }

    fn url(&self) -> &str {
        &self.url
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, ScraperError> {
        Err(ScraperError::Unsupported {
            capability: "script evaluation",
        })
    }

    async fn content(&self) -> Result<String, ScraperError> {
        self.body.clone().ok_or_else(|| ScraperError::Navigation {
            url: self.url.clone(),
            reason: "no document has been loaded".to_owned(),
        })
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), ScraperError> {
        // The response body is complete once navigate returns.
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<PathBuf, ScraperError> {
        let target = path.with_extension("html");
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ScraperError::Snapshot {
                    path: target.clone(),
                    source,
                })?;
        }
        let document = self
            .body
            .clone()
            .unwrap_or_else(|| format!("<!-- no document loaded for {} -->\n", self.url));
        tokio::fs::write(&target, document)
            .await
            .map_err(|source| ScraperError::Snapshot {
                path: target.clone(),
                source,
            })?;
        Ok(target)
    }

    async fn close(self) {
        tracing::debug!(url = %self.url, "page closed");
    }
}

/// Performs one GET and maps the response status onto [`ScraperError`].
async fn fetch_document(
    client: &Client,
    profile: &ContextProfile,
    url: &str,
    cookies: Option<&str>,
    referer: &str,
    timeout: Duration,
) -> Result<(String, String), ScraperError> {
    let mut request = client
        .get(url)
        .timeout(timeout)
        .header(reqwest::header::USER_AGENT, &profile.user_agent)
        .header(reqwest::header::ACCEPT, ACCEPT_HTML)
        .header(reqwest::header::ACCEPT_LANGUAGE, profile.accept_language())
        .header(reqwest::header::REFERER, referer)
        .header(reqwest::header::CACHE_CONTROL, "no-cache");

    if let Some(cookies) = cookies {
        request = request.header(reqwest::header::COOKIE, cookies);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(e, url, timeout))?;
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ScraperError::RateLimited {
            domain: origin::extract_domain(url),
            retry_after_secs,
        });
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, url, timeout))?;
    Ok((final_url, body))
}

fn transport_error(err: reqwest::Error, url: &str, timeout: Duration) -> ScraperError {
    if err.is_timeout() {
        ScraperError::NavigationTimeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        }
    } else {
        ScraperError::Http(err)
    }
}

/// Serializes cookies into a `Cookie` header value, percent-encoding values
/// so non-ASCII city names survive the header.
fn cookie_header(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let header = cookies
        .iter()
        .map(|c| {
            let value: String = url::form_urlencoded::byte_serialize(c.value.as_bytes()).collect();
            format!("{}={value}", c.name)
        })
        .collect::<Vec<_>>()
        .join("; ");
    Some(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_header_none_when_empty() {
        assert!(cookie_header(&[]).is_none());
    }

    #[test]
    fn cookie_header_percent_encodes_city() {
        let header = cookie_header(&[Cookie::selected_city("Екатеринбург")]).unwrap();
        assert_eq!(
            header,
            "selectedCity=%D0%95%D0%BA%D0%B0%D1%82%D0%B5%D1%80%D0%B8%D0%BD%D0%B1%D1%83%D1%80%D0%B3"
        );
        assert!(header.is_ascii());
    }

    #[test]
    fn cookie_header_joins_multiple_cookies() {
        let cookies = [
            Cookie {
                name: "a".to_owned(),
                value: "1".to_owned(),
            },
            Cookie {
                name: "b".to_owned(),
                value: "2".to_owned(),
            },
        ];
        assert_eq!(cookie_header(&cookies).unwrap(), "a=1; b=2");
    }

    #[tokio::test]
    async fn content_before_navigation_is_an_error() {
        let session = HttpSession::new(5, 0, 0).unwrap();
        let profile = ContextProfile::from_config(&fpcrawl_core::CrawlConfig::for_tests(
            PathBuf::from("/tmp"),
        ));
        let page = session.new_page(&profile).await.unwrap();
        assert!(matches!(
            page.content().await,
            Err(ScraperError::Navigation { .. })
        ));
        assert!(matches!(
            page.evaluate("1 + 1").await,
            Err(ScraperError::Unsupported { .. })
        ));
        page.close().await;
    }
}
