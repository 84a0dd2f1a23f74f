use crate::models::ListingRecord;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const CARD_SELECTOR: &str = "div.card.ad__card";
const DESCRIPTION_SELECTOR: &str = ".ad__card-description";
const PRICE_SELECTOR: &str = ".ad__card-price";
const LOCATION_SELECTOR: &str = ".ad__card-location";
const IMAGE_SELECTOR: &str = "img";

const CURRENCY_TOKEN: &str = "CFA";
const LOCATION_ICON_TOKEN: &str = "location_on";

/// Pulls listing records out of a catalog page.
pub struct ListingExtractor {
    card: Selector,
    description: Selector,
    price: Selector,
    location: Selector,
    image: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {}", css, e))
}

impl ListingExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: selector(CARD_SELECTOR)?,
            description: selector(DESCRIPTION_SELECTOR)?,
            price: selector(PRICE_SELECTOR)?,
            location: selector(LOCATION_SELECTOR)?,
            image: selector(IMAGE_SELECTOR)?,
        })
    }

    /// Extract every well-formed card, in document order.
    ///
    /// Cards missing any of the four fields are dropped without a trace in the output.
    pub fn extract(&self, markup: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(markup);

        let mut cards = 0;
        let records: Vec<ListingRecord> = document
            .select(&self.card)
            .inspect(|_| cards += 1)
            .filter_map(|card| self.extract_card(card))
            .collect();

        debug!("Extracted {} of {} listing cards", records.len(), cards);
        records
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Option<ListingRecord> {
        let kind = first_text(card, &self.description)?.trim().to_string();
        let price = strip_currency(&first_text(card, &self.price)?);
        let address = strip_location_icon(&first_text(card, &self.location)?);
        let image_url = card.select(&self.image).next()?.value().attr("src")?.to_string();

        Some(ListingRecord {
            kind,
            price,
            address,
            image_url,
        })
    }
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

/// Remove the currency suffix from a price label. Applying it twice changes nothing.
pub fn strip_currency(raw: &str) -> String {
    raw.replace(CURRENCY_TOKEN, "").trim().to_string()
}

/// Remove the icon ligature text that precedes a card's location
pub fn strip_location_icon(raw: &str) -> String {
    raw.replace(LOCATION_ICON_TOKEN, "").trim().to_string()
}
