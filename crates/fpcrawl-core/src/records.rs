use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attribute key carrying the weight/volume segment of a listing title.
pub const SIZE_ATTRIBUTE: &str = "Вес/Объем";

/// Attribute key reserved for the product description. Catalog pages do not
/// render descriptions, so the value is always empty.
pub const DESCRIPTION_ATTRIBUTE: &str = "__description";

/// A product listing captured from a catalog page, normalized into the shape
/// emitted to record sinks.
///
/// Built once per listing and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// When the listing was normalized.
    pub captured_at: DateTime<Utc>,
    /// Absolute URL of the product detail page.
    pub source_url: String,
    /// First title segment, plus the second segment when present,
    /// e.g. `"Зубная паста, Colgate"`.
    pub title: String,
    /// Second title segment, or empty.
    pub brand: String,
    /// Promotional stickers shown on the card (zero or one entry).
    pub marketing_tags: Vec<String>,
    pub price: PriceData,
    pub availability: Availability,
    pub assets: Assets,
    /// Always carries [`SIZE_ATTRIBUTE`] and [`DESCRIPTION_ATTRIBUTE`].
    pub attributes: BTreeMap<String, String>,
    /// Variant detection is not available from catalog cards; always `0`.
    pub variant_count: u32,
}

impl ProductRecord {
    /// Returns the weight/volume attribute, or `""` when the title had a
    /// single segment.
    #[must_use]
    pub fn size(&self) -> &str {
        self.attributes
            .get(SIZE_ATTRIBUTE)
            .map_or("", String::as_str)
    }
}

/// Price block of a [`ProductRecord`].
///
/// `original >= current` always holds; `discount_label` is non-empty exactly
/// when `original > current`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceData {
    pub current: f64,
    pub original: f64,
    /// e.g. `"Скидка 50%"`, or `""` when not discounted.
    pub discount_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub in_stock: bool,
    /// Stock level is not exposed on catalog pages; always `0`.
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    /// First entry of `images`, or `""`.
    pub main_image: String,
    pub images: Vec<String>,
    pub panorama: Vec<String>,
    pub video: Vec<String>,
}

impl Assets {
    /// Builds an asset bundle from slide images in display order.
    #[must_use]
    pub fn from_images(images: Vec<String>) -> Self {
        Self {
            main_image: images.first().cloned().unwrap_or_default(),
            images,
            panorama: Vec::new(),
            video: Vec::new(),
        }
    }
}
