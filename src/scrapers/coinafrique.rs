use crate::models::{PageOutcome, PageReport, ScrapeResult};
use crate::progress::Progress;
use crate::scrapers::extractor::ListingExtractor;
use crate::scrapers::fetcher::{FetchError, HttpFetcher};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::ScrapeParams;
use anyhow::Result;
use tracing::{debug, info, warn};
use url::Url;

/// Paginated catalog scraper for CoinAfrique-style listing pages.
pub struct CoinAfriqueScraper<F = HttpFetcher> {
    fetcher: F,
    extractor: ListingExtractor,
}

impl CoinAfriqueScraper<HttpFetcher> {
    /// Create a scraper that fetches over HTTP
    pub fn new() -> Result<Self> {
        Self::with_fetcher(HttpFetcher::new()?)
    }
}

impl<F: PageFetcher> CoinAfriqueScraper<F> {
    pub fn with_fetcher(fetcher: F) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor: ListingExtractor::new()?,
        })
    }

    pub async fn scrape(&self, params: &ScrapeParams, progress: &mut dyn Progress) -> ScrapeResult {
        self.scrape_all(&params.base_url, params.pages, progress).await
    }

    /// Scrape pages `1..=page_count` of `base_url`, one after another.
    ///
    /// A page that cannot be fetched contributes no records; the run always
    /// attempts every page and never fails as a whole.
    pub async fn scrape_all(
        &self,
        base_url: &str,
        page_count: u32,
        progress: &mut dyn Progress,
    ) -> ScrapeResult {
        info!("Starting scrape of {} ({} pages)", base_url, page_count);

        let mut result = ScrapeResult::new();
        progress.begin(page_count);

        for page in 1..=page_count {
            let report = match page_url(base_url, page) {
                Ok(url) => {
                    debug!("Scraping page {}...", page);
                    progress.page_started(page, &url);
                    let outcome = self.scrape_page(&url, &mut result).await;
                    PageReport { page, url, outcome }
                }
                Err(e) => {
                    warn!("Skipping page {}: {}", page, e);
                    PageReport {
                        page,
                        url: base_url.to_string(),
                        outcome: PageOutcome::Failed {
                            reason: e.to_string(),
                        },
                    }
                }
            };

            result.pages.push(report);
            progress.page_done(page, f64::from(page) / f64::from(page_count));
        }

        progress.finish();

        if result.is_empty() {
            warn!("No listings found across {} pages of {}", page_count, base_url);
        } else {
            info!("Successfully scraped {} listings", result.len());
        }

        result
    }

    async fn scrape_page(&self, url: &str, result: &mut ScrapeResult) -> PageOutcome {
        match self.fetcher.fetch(url).await {
            Ok(markup) => {
                let records = self.extractor.extract(&markup);
                let count = records.len();
                result.records.extend(records);
                PageOutcome::Extracted { records: count }
            }
            Err(e) => {
                warn!("Skipping {}: {}", url, e);
                PageOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Build the URL of one catalog page.
///
/// `page=<n>` is added as an extra query pair, so a base URL that already
/// carries a query string gets `&page=<n>` rather than a second `?`.
pub fn page_url(base_url: &str, page: u32) -> Result<String, FetchError> {
    let mut url = Url::parse(base_url).map_err(|source| FetchError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    Ok(url.into())
}
