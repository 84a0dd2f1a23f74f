pub mod coinafrique;
pub mod extractor;
pub mod fetcher;
pub mod traits;
pub mod types;

pub use coinafrique::CoinAfriqueScraper;
