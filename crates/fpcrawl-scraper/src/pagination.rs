//! Catalog pagination via the "next page" arrow control.
//!
//! Catalog pages render a forward arrow as
//! ```html
//! <a class="pagination__item pagination__item--arrow_right" href="?page=2">→</a>
//! ```
//! on every page except the last. The `href` is usually a bare query string,
//! so it is resolved against the URL of the page it appears on.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::normalize::resolve_url;

static NEXT_PAGE_CONTROL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a.pagination__item--arrow_right").expect("valid next page selector")
});

/// Why a traversal branch stops after the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// The page has no forward control: last page reached.
    NoNextControl,
    /// The forward control exists but carries no target.
    EmptyReference,
    /// The target could not be resolved to an absolute URL.
    Unresolvable { reference: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    Target(String),
    Terminal(Terminal),
}

/// The page a branch is on and what follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub current: String,
    pub next: NextPage,
}

impl PageCursor {
    /// Absolute URL of the next page, or `None` when the branch ends here.
    #[must_use]
    pub fn next_target(&self) -> Option<&str> {
        match &self.next {
            NextPage::Target(url) => Some(url),
            NextPage::Terminal(_) => None,
        }
    }
}

/// Inspects a rendered catalog DOM for the next-page control.
///
/// Never fails: a missing control, an empty `href`, or a reference that does
/// not resolve against `page_url` all end the traversal.
#[must_use]
pub fn inspect_pagination(html: &str, page_url: &str) -> PageCursor {
    let document = Html::parse_document(html);
    let reference = document
        .select(&NEXT_PAGE_CONTROL)
        .next()
        .map(|control| control.value().attr("href").unwrap_or_default().trim().to_owned());

    PageCursor {
        current: page_url.to_owned(),
        next: next_from_reference(reference.as_deref(), page_url),
    }
}

fn next_from_reference(reference: Option<&str>, page_url: &str) -> NextPage {
    let Some(reference) = reference else {
        return NextPage::Terminal(Terminal::NoNextControl);
    };
    if reference.is_empty() {
        return NextPage::Terminal(Terminal::EmptyReference);
    }
    match resolve_url(page_url, reference) {
        Ok(url) => NextPage::Target(url),
        Err(err) => NextPage::Terminal(Terminal::Unresolvable {
            reference: reference.to_owned(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_control(control: &str) -> String {
        format!(
            r#"<html><body><div class="product"></div><nav class="pagination">
                <a class="pagination__item" href="?page=1">1</a>{control}</nav></body></html>"#
        )
    }

    #[test]
    fn no_control_is_terminal() {
        let html = page_with_control("");
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(cursor.next, NextPage::Terminal(Terminal::NoNextControl));
        assert!(cursor.next_target().is_none());
    }

    #[test]
    fn query_reference_resolves_against_page_url() {
        let html = page_with_control(
            r#"<a class="pagination__item pagination__item--arrow_right" href="?page=2">→</a>"#,
        );
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(cursor.current, "https://site/cat");
        assert_eq!(cursor.next_target(), Some("https://site/cat?page=2"));
    }

    #[test]
    fn query_reference_replaces_existing_query() {
        let html = page_with_control(
            r#"<a class="pagination__item--arrow_right" href="?page=3">→</a>"#,
        );
        let cursor = inspect_pagination(&html, "https://site/cat?page=2");
        assert_eq!(cursor.next_target(), Some("https://site/cat?page=3"));
    }

    #[test]
    fn root_relative_reference_resolves_to_site_root() {
        let html = page_with_control(
            r#"<a class="pagination__item--arrow_right" href="/catalog/other?page=2">→</a>"#,
        );
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(
            cursor.next_target(),
            Some("https://site/catalog/other?page=2")
        );
    }

    #[test]
    fn absolute_reference_is_kept() {
        let html = page_with_control(
            r#"<a class="pagination__item--arrow_right" href="https://other.site/cat?page=2">→</a>"#,
        );
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(cursor.next_target(), Some("https://other.site/cat?page=2"));
    }

    #[test]
    fn control_without_href_is_terminal() {
        let html = page_with_control(r#"<a class="pagination__item--arrow_right">→</a>"#);
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(cursor.next, NextPage::Terminal(Terminal::EmptyReference));
    }

    #[test]
    fn control_with_blank_href_is_terminal() {
        let html = page_with_control(r#"<a class="pagination__item--arrow_right" href="  ">→</a>"#);
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(cursor.next, NextPage::Terminal(Terminal::EmptyReference));
    }

    #[test]
    fn unresolvable_reference_is_terminal_not_error() {
        let html = page_with_control(
            r#"<a class="pagination__item--arrow_right" href="?page=2">→</a>"#,
        );
        let cursor = inspect_pagination(&html, "not a url");
        assert!(matches!(
            cursor.next,
            NextPage::Terminal(Terminal::Unresolvable { .. })
        ));
        assert!(cursor.next_target().is_none());
    }

    #[test]
    fn non_anchor_arrow_is_ignored() {
        let html = page_with_control(
            r#"<span class="pagination__item--arrow_right" data-href="?page=2">→</span>"#,
        );
        let cursor = inspect_pagination(&html, "https://site/cat");
        assert_eq!(cursor.next, NextPage::Terminal(Terminal::NoNextControl));
    }
}
