//! Price distribution of a cleaned dataset.
//!
//! The scraper keeps prices as text; this is the only place they are coerced
//! to numbers. Cells that do not parse are dropped, not reported.

use crate::datasets::Dataset;
use std::fmt::Write;
use thiserror::Error;

pub const PRICE_COLUMN: &str = "prix";
pub const BIN_WIDTH: i64 = 5000;

/// Largest number of bins a chart may span
pub const MAX_BINS: i64 = 1000;

const BAR_WIDTH: usize = 40;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("the 'prix' column was not found in the data")]
    MissingPriceColumn,

    #[error("no valid values found in the 'prix' column")]
    NoValidPrices,

    #[error("prices span more than 1000 intervals of 5000, too wide to chart")]
    PriceRangeTooWide,
}

/// Half-open price interval `[lower, upper)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBin {
    pub lower: i64,
    pub upper: i64,
    pub count: usize,
}

impl PriceBin {
    pub fn label(&self) -> String {
        format!("[{}, {})", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistogram {
    /// Contiguous bins in ascending order, empty ones included
    pub bins: Vec<PriceBin>,
    pub valid: usize,
    pub dropped: usize,
}

/// Parse a price cell, returning `None` for anything that is not a finite number.
pub fn coerce_price(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

pub fn price_histogram(dataset: &Dataset) -> Result<PriceHistogram, DashboardError> {
    let column = dataset
        .column(PRICE_COLUMN)
        .ok_or(DashboardError::MissingPriceColumn)?;

    let prices: Vec<f64> = column.iter().filter_map(|cell| coerce_price(cell)).collect();
    if prices.is_empty() {
        return Err(DashboardError::NoValidPrices);
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let width = BIN_WIDTH as f64;
    let first = bin_index(min)?;
    let last = bin_index(max)?;
    let bin_count = last
        .checked_sub(first)
        .and_then(|span| span.checked_add(1))
        .filter(|count| *count <= MAX_BINS)
        .ok_or(DashboardError::PriceRangeTooWide)?;
    let lo = first
        .checked_mul(BIN_WIDTH)
        .ok_or(DashboardError::PriceRangeTooWide)?;
    // Upper edge of the last bin must be representable too
    last.checked_add(1)
        .and_then(|end| end.checked_mul(BIN_WIDTH))
        .ok_or(DashboardError::PriceRangeTooWide)?;

    let bin_count = bin_count as usize;
    let mut bins: Vec<PriceBin> = (0..bin_count)
        .map(|i| {
            let lower = lo + i as i64 * BIN_WIDTH;
            PriceBin {
                lower,
                upper: lower + BIN_WIDTH,
                count: 0,
            }
        })
        .collect();

    for price in &prices {
        let idx = ((price - lo as f64) / width).floor() as usize;
        bins[idx.min(bin_count - 1)].count += 1;
    }

    Ok(PriceHistogram {
        bins,
        valid: prices.len(),
        dropped: column.len() - prices.len(),
    })
}

/// Index of the `BIN_WIDTH` interval holding `price`, counted from zero
fn bin_index(price: f64) -> Result<i64, DashboardError> {
    let index = (price / BIN_WIDTH as f64).floor();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if index >= i64::MIN as f64 && index < i64::MAX as f64 {
        Ok(index as i64)
    } else {
        Err(DashboardError::PriceRangeTooWide)
    }
}

/// Draw the histogram as a horizontal bar chart
pub fn render_histogram(histogram: &PriceHistogram) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Price distribution by {BIN_WIDTH} intervals");
    let _ = writeln!(out, "Price range (CFA) / number of items");
    let _ = writeln!(out);

    let label_width = histogram
        .bins
        .iter()
        .map(|b| b.label().len())
        .max()
        .unwrap_or(0);
    let max_count = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0);

    for bin in &histogram.bins {
        let bar_len = match (bin.count, max_count) {
            (0, _) | (_, 0) => 0,
            (count, max) => ((count * BAR_WIDTH) / max).max(1),
        };
        let _ = writeln!(
            out,
            "{:>label_width$} │{} {}",
            bin.label(),
            "█".repeat(bar_len),
            bin.count
        );
    }

    if histogram.dropped > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} rows without a numeric price were left out", histogram.dropped);
    }

    out
}
