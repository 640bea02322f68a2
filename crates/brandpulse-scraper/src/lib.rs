pub mod client;
pub mod collector;
pub mod error;
pub mod normalize;
pub(crate) mod parse_helpers;
pub(crate) mod rate_limit;
pub mod types;

pub use client::{ScraperClient, ScraperSettings};
pub use collector::collect;
pub use error::ScraperError;
pub use normalize::{normalize_item, normalize_items, NormalizedItems};
