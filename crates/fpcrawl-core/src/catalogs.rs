use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A catalog category page to crawl, with the city it should be priced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTarget {
    pub name: String,
    pub url: String,
    /// Sent as the `selectedCity` cookie; prices and stock depend on it.
    #[serde(default)]
    pub city: Option<String>,
}

impl CatalogTarget {
    /// Builds an ad-hoc target for a URL passed on the command line.
    #[must_use]
    pub fn from_url(url: &str, city: Option<String>) -> Self {
        Self {
            name: url.to_string(),
            url: url.to_string(),
            city,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogsFile {
    pub catalogs: Vec<CatalogTarget>,
}

impl CatalogsFile {
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CatalogTarget> {
        self.catalogs
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Load and validate the catalog targets from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalogs(path: &Path) -> Result<CatalogsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let catalogs_file: CatalogsFile = serde_yaml::from_str(&content)?;

    validate_catalogs(&catalogs_file)?;

    Ok(catalogs_file)
}

fn validate_catalogs(catalogs_file: &CatalogsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for catalog in &catalogs_file.catalogs {
        if catalog.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(catalog.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate catalog name: '{}'",
                catalog.name
            )));
        }

        let parsed = url::Url::parse(&catalog.url).map_err(|e| {
            ConfigError::Validation(format!(
                "catalog '{}' has invalid url '{}': {e}",
                catalog.name, catalog.url
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "catalog '{}' url must be http or https, got '{}'",
                catalog.name,
                parsed.scheme()
            )));
        }

        if catalog.city.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "catalog '{}' has an empty city",
                catalog.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "catalogs_test.rs"]
mod tests;
