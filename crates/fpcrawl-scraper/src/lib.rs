pub mod client;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod listing;
pub mod normalize;
pub mod pagination;
mod parse;
pub mod rate_limit;
pub mod session;
pub mod sink;

pub use client::{HttpPage, HttpSession};
pub use crawler::{
    BranchExit, BranchOutcome, BranchState, CatalogCrawler, CrawlSeed, CrawlSummary,
};
pub use error::ScraperError;
pub use extract::extract_listings;
pub use listing::RawListing;
pub use normalize::{normalize_listing, normalize_listing_at};
pub use pagination::{inspect_pagination, NextPage, PageCursor, Terminal};
pub use session::{BrowserSession, ContextProfile, Cookie, NavigationRequest, PageHandle};
pub use sink::RecordSink;
