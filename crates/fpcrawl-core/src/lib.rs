pub mod app_config;
pub mod catalogs;
pub mod config;
pub mod error;
pub mod records;

pub use app_config::{CrawlConfig, DelayRange, Environment, Viewport};
pub use catalogs::{load_catalogs, CatalogTarget, CatalogsFile};
pub use config::{load_crawl_config, load_crawl_config_from_env};
pub use error::ConfigError;
pub use records::{
    Assets, Availability, PriceData, ProductRecord, DESCRIPTION_ATTRIBUTE, SIZE_ATTRIBUTE,
};
