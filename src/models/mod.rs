use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One classified ad as it appears on a catalog page.
///
/// Every field is kept as the raw text scraped from the card. The price has its
/// currency suffix removed but is not parsed; the dashboard coerces it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Prix")]
    pub price: String,
    #[serde(rename = "Adresse")]
    pub address: String,
    #[serde(rename = "Image")]
    pub image_url: String,
}

impl ListingRecord {
    /// Column names used when a record is written out as a table row.
    pub const COLUMNS: [&'static str; 4] = ["Type", "Prix", "Adresse", "Image"];

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.kind.clone(),
            self.price.clone(),
            self.address.clone(),
            self.image_url.clone(),
        ]
    }
}

/// What happened to a single catalog page during a scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    /// Page was fetched; `records` cards survived extraction.
    Extracted { records: usize },
    /// Page could not be fetched and contributed nothing.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    pub page: u32,
    pub url: String,
    pub outcome: PageOutcome,
}

/// Ordered aggregate of all records extracted during one scrape run.
///
/// Records are ordered by page number, then by card position within the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub records: Vec<ListingRecord>,
    pub pages: Vec<PageReport>,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapeResult {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            pages: Vec::new(),
            scraped_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pages whose fetch failed, in the order they were attempted
    pub fn failed_pages(&self) -> Vec<u32> {
        self.pages
            .iter()
            .filter(|report| matches!(report.outcome, PageOutcome::Failed { .. }))
            .map(|report| report.page)
            .collect()
    }
}

impl Default for ScrapeResult {
    fn default() -> Self {
        Self::new()
    }
}
