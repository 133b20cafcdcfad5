pub mod client;
pub mod decode;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod pagination;
pub mod types;

pub use client::LoziClient;
pub use decode::decode_page;
pub use error::{PlanningError, ScraperError};
pub use fetcher::{Fetcher, ListingQuery, PageFetcher};
pub use normalize::normalize_eatery;
pub use pagination::{plan, plan_crawl, CrawlPlan, PageRounding, PaginationMode};
pub use types::{Eatery, EateriesPage, Pagination, RecordRejection};
