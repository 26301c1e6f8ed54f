//! Raw product-card fields as read from a catalog page.
//!
//! A [`RawListing`] is produced by [`crate::extract`] and consumed exactly once
//! by [`crate::normalize`]. Nothing here is interpreted: prices are the
//! localized strings shown on the card (e.g. `"199,90 ₽"`) and `detail_url`
//! is the anchor's `href` exactly as written in the markup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    /// Product detail link, possibly relative to the catalog page.
    pub detail_url: String,

    /// Visible anchor text. May embed brand and size after commas, e.g.
    /// `"Зубная паста, Colgate, 100 мл"`.
    pub full_title: String,

    /// Second comma segment of the anchor text. Informational only; the
    /// normalizer derives the record's brand from `full_title` itself.
    #[serde(default)]
    pub brand: Option<String>,

    #[serde(default)]
    pub current_price_text: Option<String>,

    /// Present only when the card shows a struck-through "old price".
    #[serde(default)]
    pub original_price_text: Option<String>,

    /// Promotional sticker text, e.g. `"Хит"`.
    #[serde(default)]
    pub badge_text: Option<String>,

    /// Slide image sources in display order.
    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Catalog cards carry no stock signal, so this defaults to `true`.
    #[serde(default = "default_available")]
    pub available_hint: bool,
}

fn default_available() -> bool {
    true
}
