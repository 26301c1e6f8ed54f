//! Normalization from [`RawListing`] to [`fpcrawl_core::ProductRecord`].
//!
//! Title and price parsing is delegated to [`crate::parse`]; this module
//! focuses on assembling the record and upholding its price invariants.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fpcrawl_core::{
    Assets, Availability, PriceData, ProductRecord, DESCRIPTION_ATTRIBUTE, SIZE_ATTRIBUTE,
};
use url::Url;

use crate::error::ScraperError;
use crate::listing::RawListing;
use crate::parse::{discount_label, parse_price, split_title};

/// Normalizes a [`RawListing`] captured on `page_url`, stamping the current
/// time as the capture time.
///
/// # Errors
///
/// - [`ScraperError::InvalidUrl`] if `page_url` is not absolute or the detail
///   link cannot be resolved against it.
/// - [`ScraperError::PriceParse`] if a price text is present but not numeric.
pub fn normalize_listing(
    listing: RawListing,
    page_url: &str,
) -> Result<ProductRecord, ScraperError> {
    normalize_listing_at(listing, page_url, Utc::now())
}

/// Same as [`normalize_listing`] with an explicit capture time.
///
/// # Errors
///
/// See [`normalize_listing`].
pub fn normalize_listing_at(
    listing: RawListing,
    page_url: &str,
    captured_at: DateTime<Utc>,
) -> Result<ProductRecord, ScraperError> {
    let source_url = resolve_url(page_url, &listing.detail_url)?;
    let parts = split_title(&listing.full_title);

    let current = match non_blank(listing.current_price_text.as_deref()) {
        Some(raw) => parse_price(raw).ok_or_else(|| ScraperError::PriceParse {
            field: "current",
            raw: raw.to_owned(),
        })?,
        None => 0.0,
    };

    let original = match non_blank(listing.original_price_text.as_deref()) {
        Some(raw) => parse_price(raw).ok_or_else(|| ScraperError::PriceParse {
            field: "original",
            raw: raw.to_owned(),
        })?,
        None => current,
    };

    // A struck-through price below the selling price is a markup glitch; the
    // record never reports an original price under the current one.
    let original = if original < current {
        tracing::debug!(
            source_url = %source_url,
            current,
            original,
            "old price below current price, clamping to current"
        );
        current
    } else {
        original
    };

    let mut attributes = BTreeMap::new();
    attributes.insert(SIZE_ATTRIBUTE.to_string(), parts.size);
    attributes.insert(DESCRIPTION_ATTRIBUTE.to_string(), String::new());

    Ok(ProductRecord {
        captured_at,
        source_url,
        title: parts.title,
        brand: parts.brand,
        marketing_tags: listing.badge_text.into_iter().collect(),
        price: PriceData {
            current,
            original,
            discount_label: discount_label(current, original),
        },
        availability: Availability {
            in_stock: listing.available_hint,
            count: 0,
        },
        assets: Assets::from_images(listing.image_urls),
        attributes,
        variant_count: 0,
    })
}

/// Resolves `reference` against `base`, returning an absolute URL string.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base` is not an absolute URL or
/// the join fails.
pub(crate) fn resolve_url(base: &str, reference: &str) -> Result<String, ScraperError> {
    let base_url = Url::parse(base).map_err(|e| ScraperError::InvalidUrl {
        url: base.to_owned(),
        reason: e.to_string(),
    })?;
    base_url
        .join(reference.trim())
        .map(String::from)
        .map_err(|e| ScraperError::InvalidUrl {
            url: reference.to_owned(),
            reason: e.to_string(),
        })
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
