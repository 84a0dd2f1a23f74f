use serde::{Deserialize, Serialize};

/// Catalog scraped when no base URL is given
pub const DEFAULT_BASE_URL: &str = "https://sn.coinafrique.com/categorie/vetements-homme";

/// Upper bound on pages accepted from the command line
pub const MAX_PAGES: u32 = 120;

/// Parameters for a paginated catalog scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeParams {
    /// Catalog listing URL, without the page parameter
    pub base_url: String,
    /// Number of pages to fetch, starting at page 1
    pub pages: u32,
}

impl Default for ScrapeParams {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pages: 10,
        }
    }
}
