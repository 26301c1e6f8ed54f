//! Product-card extraction from a rendered catalog DOM snapshot.
//!
//! Operates on the serialized DOM returned by
//! [`crate::session::PageHandle::content`], so the same code runs against a
//! headless browser, a plain HTTP fetch, or a fixture in tests. Extraction is
//! a pure read: no navigation or network access happens here.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::listing::RawListing;

static PRODUCT_CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.product").expect("valid product card selector"));
static TITLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.title").expect("valid title selector"));
static CURRENT_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".special-price").expect("valid price selector"));
static ORIGINAL_PRICE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".regular-price.old-price").expect("valid old price selector")
});
static SLIDE_IMAGE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".swiper-slide img").expect("valid image selector"));
static STICKER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".sticker").expect("valid sticker selector"));

/// Lazy-loading attribute checked before the eager `src`.
const LAZY_SRC_ATTR: &str = "data-src";

/// Extracts every identifiable product card from `html`, in document order.
///
/// Cards without a title anchor, or whose anchor has no `href`, are skipped.
#[must_use]
pub fn extract_listings(html: &str) -> Vec<RawListing> {
    let document = Html::parse_document(html);
    extract_from_document(&document)
}

pub(crate) fn extract_from_document(document: &Html) -> Vec<RawListing> {
    document
        .select(&PRODUCT_CARD)
        .filter_map(extract_card)
        .collect()
}

fn extract_card(card: ElementRef<'_>) -> Option<RawListing> {
    let link = card.select(&TITLE_LINK).next()?;
    let detail_url = link
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())?
        .to_owned();

    let full_title = visible_text(link);
    let brand = full_title
        .split(',')
        .nth(1)
        .map(str::trim)
        .map(str::to_owned);

    let current_price_text = first_text(card, &CURRENT_PRICE);
    let original_price_text = first_text(card, &ORIGINAL_PRICE);
    let badge_text = first_text(card, &STICKER);

    let image_urls = card
        .select(&SLIDE_IMAGE)
        .filter_map(|img| {
            let value = img.value();
            [value.attr(LAZY_SRC_ATTR), value.attr("src")]
                .into_iter()
                .flatten()
                .map(str::trim)
                .find(|src| !src.is_empty())
                .map(str::to_owned)
        })
        .collect();

    Some(RawListing {
        detail_url,
        full_title,
        brand,
        current_price_text,
        original_price_text,
        badge_text,
        image_urls,
        available_hint: true,
    })
}

/// Text of the first element matching `selector` under `scope`, or `None`
/// when the element is missing or blank.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(visible_text)
        .filter(|text| !text.is_empty())
}

/// Concatenated descendant text with whitespace runs collapsed, approximating
/// what a browser reports as `innerText`.
fn visible_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
