use crate::scrapers::fetcher::FetchError;
use async_trait::async_trait;

/// Source of raw page markup.
/// The pagination driver only talks to this trait, so tests can swap the network out.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one fully-formed page URL and return its body
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
