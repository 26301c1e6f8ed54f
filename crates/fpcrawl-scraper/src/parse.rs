//! Low-level string parsing helpers for listing titles and localized prices.
//!
//! These functions use plain string scanning rather than `regex`. See
//! [`crate::normalize`] for how they compose into a full record.

/// Currency markers stripped from the end of a price string. Longer forms
/// come first so `"руб."` is not left as `"руб"` minus one character.
const CURRENCY_MARKERS: [&str; 4] = ["₽", "руб.", "руб", "р."];

/// A listing title split on commas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TitleParts {
    /// First segment, suffixed with `", {second}"` when a second exists.
    pub title: String,
    /// Second segment, or empty.
    pub brand: String,
    /// Last segment when there are at least two, or empty.
    ///
    /// With exactly two segments the same text also ends up in `title` and
    /// `brand`; catalog titles usually have three.
    pub size: String,
}

/// Splits `"Зубная паста, Colgate, 100 мл"` into title
/// `"Зубная паста, Colgate"`, brand `"Colgate"`, size `"100 мл"`.
#[must_use]
pub(crate) fn split_title(full_title: &str) -> TitleParts {
    let parts: Vec<&str> = full_title.split(',').map(str::trim).collect();

    let mut title = parts.first().copied().unwrap_or_default().to_owned();

    let brand = match parts.as_slice() {
        [_, second, ..] => (*second).to_owned(),
        _ => String::new(),
    };
    if parts.len() > 1 {
        title.push_str(", ");
        title.push_str(&brand);
    }

    let size = match parts.as_slice() {
        [_, .., last] => (*last).to_owned(),
        _ => String::new(),
    };

    TitleParts { title, brand, size }
}

/// Parses a localized price such as `"199,90 ₽"` or `"1 299,00 ₽"`.
///
/// Whitespace (including non-breaking and narrow no-break spaces used as
/// thousands separators) and a trailing currency marker are removed, then a
/// decimal comma is converted to a point. When a comma is present any dots
/// are treated as thousands separators.
///
/// Returns `None` if anything other than digits and separators remains.
#[must_use]
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let mut body = compact.as_str();
    for marker in CURRENCY_MARKERS {
        if let Some(stripped) = body.strip_suffix(marker) {
            body = stripped;
            break;
        }
    }

    if !body.chars().any(|c| c.is_ascii_digit())
        || !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }

    let normalized = if body.contains(',') {
        body.replace('.', "").replace(',', ".")
    } else {
        body.to_owned()
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds the discount label for a price pair.
///
/// Non-empty exactly when `original > current`. The percentage is rounded to
/// the nearest integer with ties going to the even neighbour.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn discount_label(current: f64, original: f64) -> String {
    if original <= current {
        return String::new();
    }
    // original > current >= 0 here, so the ratio lies in (0, 100].
    let percent = ((original - current) / original * 100.0).round_ties_even();
    format!("Скидка {}%", percent as u32)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
