//! URL origin and domain extraction utilities for the HTTP page session.

/// Extracts the scheme+host origin from a page URL, used as the `Referer`.
///
/// Given `"https://fix-price.com/catalog/dlya-doma?page=2"`, returns
/// `"https://fix-price.com"`.
#[must_use]
pub fn extract_origin(page_url: &str) -> String {
    url::Url::parse(page_url).map_or_else(
        |e| {
            tracing::warn!(
                page_url,
                error = %e,
                "could not parse page URL; falling back to string split for origin extraction"
            );
            page_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a page URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(super) fn extract_domain(page_url: &str) -> String {
    url::Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| page_url.to_owned())
}
