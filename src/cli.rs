use crate::dashboard::{price_histogram, render_histogram};
use crate::datasets::{
    find_dataset, list_datasets, load_dataset, write_dataset, Bucket, Dataset, ExportFormat,
    DEFAULT_CLEANED_DIR, DEFAULT_RAW_DIR,
};
use crate::models::PageOutcome;
use crate::progress::{BarProgress, NullProgress, Progress};
use crate::scrapers::types::{ScrapeParams, DEFAULT_BASE_URL, MAX_PAGES};
use crate::scrapers::CoinAfriqueScraper;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PREVIEW_CELL_WIDTH: usize = 40;
const DEFAULT_SCRAPE_STEM: &str = "data_scrapees";

#[derive(Parser)]
#[command(name = "ad-scout")]
#[command(about = "Scrape classified-ad listings, browse the datasets and chart their prices")]
pub struct Cli {
    /// Directory holding scraped, uncleaned datasets
    #[arg(long, global = true, default_value = DEFAULT_RAW_DIR)]
    pub raw_dir: PathBuf,

    /// Directory holding cleaned datasets for the dashboard
    #[arg(long, global = true, default_value = DEFAULT_CLEANED_DIR)]
    pub cleaned_dir: PathBuf,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scrape catalog pages and save the listings to the raw directory
    Scrape {
        /// Catalog URL without the page parameter
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Number of pages to scrape
        #[arg(
            short,
            long,
            default_value_t = ScrapeParams::default().pages,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGES))
        )]
        pages: u32,

        /// Output file (defaults to `data_scrapees.<format>` in the raw directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Number of rows to print after scraping
        #[arg(long, default_value_t = 5)]
        preview: usize,

        /// Print the results without writing a file
        #[arg(long)]
        no_save: bool,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the datasets available in the raw or cleaned directory
    Datasets {
        #[arg(value_enum)]
        bucket: Bucket,
    },

    /// Convert a raw dataset to another format
    Export {
        /// File name inside the raw directory
        file: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output file (defaults to `<name>.<format>` in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Chart the price distribution of a cleaned dataset
    Dashboard {
        /// File name inside the cleaned directory
        file: String,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scrape {
            base_url,
            pages,
            output,
            format,
            preview,
            no_save,
            quiet,
        } => {
            let params = ScrapeParams { base_url, pages };
            let output = if no_save {
                None
            } else {
                Some(output.unwrap_or_else(|| default_scrape_path(&cli.raw_dir, format)))
            };
            let mut progress: Box<dyn Progress> = if quiet {
                Box::new(NullProgress)
            } else {
                Box::new(BarProgress::new())
            };
            scrape(&params, output.as_deref(), format, preview, progress.as_mut()).await
        }
        Command::Datasets { bucket } => {
            let dir = match bucket {
                Bucket::Raw => &cli.raw_dir,
                Bucket::Cleaned => &cli.cleaned_dir,
            };
            show_datasets(dir, bucket)
        }
        Command::Export {
            file,
            format,
            output,
        } => export(&cli.raw_dir, &file, format, output),
        Command::Dashboard { file } => dashboard(&cli.cleaned_dir, &file),
    }
}

async fn scrape(
    params: &ScrapeParams,
    output: Option<&Path>,
    format: ExportFormat,
    preview: usize,
    progress: &mut dyn Progress,
) -> Result<()> {
    let scraper = CoinAfriqueScraper::new()?;

    let result = scraper.scrape(params, progress).await;
    info!("Scrape finished at {}", result.scraped_at.format("%Y-%m-%d %H:%M:%S UTC"));

    for report in &result.pages {
        match &report.outcome {
            PageOutcome::Extracted { records } => debug!("page {} ({}): {} listings", report.page, report.url, records),
            PageOutcome::Failed { reason } => debug!("page {} ({}): failed, {}", report.page, report.url, reason),
        }
    }

    let failed = result.failed_pages();
    if !failed.is_empty() {
        warn!("{} of {} pages could not be fetched: {:?}", failed.len(), params.pages, failed);
    }

    if result.is_empty() {
        println!("No data was found.");
        return Ok(());
    }

    println!("\n✅ Scraped {} listings\n", result.len());
    let dataset = Dataset::from_records(&result.records);
    print_preview(&dataset, preview);

    if let Some(path) = output {
        write_dataset(path, &dataset, format)
            .with_context(|| format!("Failed to save listings to {}", path.display()))?;
        info!("💾 Saved {} listings to {}", dataset.len(), path.display());
    }

    Ok(())
}

/// `<raw_dir>/data_scrapees.<ext>`; a later scrape overwrites it
fn default_scrape_path(raw_dir: &Path, format: ExportFormat) -> PathBuf {
    raw_dir.join(format!("{}.{}", DEFAULT_SCRAPE_STEM, format.ext()))
}

fn show_datasets(dir: &Path, bucket: Bucket) -> Result<()> {
    let files = list_datasets(dir, bucket.formats())?;

    if files.is_empty() {
        warn!("No datasets found in {}", dir.display());
        println!("No files found in {}.", dir.display());
        return Ok(());
    }

    for file in files {
        println!("{:<6} {}", format!("{:?}", file.format).to_lowercase(), file.name);
    }
    Ok(())
}

fn export(raw_dir: &Path, name: &str, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let file = find_dataset(raw_dir, name, Bucket::Raw.formats())?;
    let dataset = load_dataset(&file.path)?;
    if dataset.is_empty() {
        warn!("{} has no data rows", file.name);
    }

    println!("Preview of {}:", file.name);
    print_preview(&dataset, 5);

    let output = output.unwrap_or_else(|| {
        let stem = Path::new(&file.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.name.clone());
        PathBuf::from(format!("{}.{}", stem, format.ext()))
    });

    write_dataset(&output, &dataset, format)
        .with_context(|| format!("Failed to export {}", file.name))?;
    info!("📥 Exported {} rows to {}", dataset.len(), output.display());
    Ok(())
}

fn dashboard(cleaned_dir: &Path, name: &str) -> Result<()> {
    let file = find_dataset(cleaned_dir, name, Bucket::Cleaned.formats())?;
    let dataset = load_dataset(&file.path)?;

    println!("Preview of {}:", file.name);
    print_preview(&dataset, 5);
    println!();

    match price_histogram(&dataset) {
        Ok(histogram) => print!("{}", render_histogram(&histogram)),
        Err(e) => {
            warn!("{}", e);
            println!("{}", e);
        }
    }
    Ok(())
}

fn print_preview(dataset: &Dataset, rows: usize) {
    println!("{}", format_row(&dataset.headers));
    for row in dataset.head(rows) {
        println!("{}", format_row(row));
    }
    if dataset.len() > rows {
        println!("... {} more rows", dataset.len() - rows);
    }
}

fn format_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|cell| truncate(cell, PREVIEW_CELL_WIDTH))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn truncate(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        cell.to_string()
    } else {
        let mut out: String = cell.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DatasetFormat;

    #[test]
    fn parses_scrape_defaults() {
        let cli = Cli::try_parse_from(["ad-scout", "scrape"]).unwrap();

        assert_eq!(cli.raw_dir, PathBuf::from("raw_data"));
        match cli.command {
            Command::Scrape { base_url, pages, format, no_save, .. } => {
                assert_eq!(base_url, DEFAULT_BASE_URL);
                assert_eq!(pages, 10);
                assert_eq!(format, ExportFormat::Csv);
                assert!(!no_save);
            }
            _ => panic!("expected scrape command"),
        }
    }

    #[test]
    fn rejects_page_counts_out_of_range() {
        assert!(Cli::try_parse_from(["ad-scout", "scrape", "--pages", "0"]).is_err());
        assert!(Cli::try_parse_from(["ad-scout", "scrape", "--pages", "121"]).is_err());
        assert!(Cli::try_parse_from(["ad-scout", "scrape", "--pages", "120"]).is_ok());
    }

    #[test]
    fn parses_bucket_and_global_dirs() {
        let cli = Cli::try_parse_from(["ad-scout", "datasets", "cleaned", "--cleaned-dir", "data/clean"]).unwrap();

        assert_eq!(cli.cleaned_dir, PathBuf::from("data/clean"));
        assert!(matches!(cli.command, Command::Datasets { bucket: Bucket::Cleaned }));
    }

    #[test]
    fn default_scrape_path_lives_in_raw_dir() {
        let path = default_scrape_path(Path::new("raw_data"), ExportFormat::Json);

        assert_eq!(path, PathBuf::from("raw_data/data_scrapees.json"));
        assert_eq!(DatasetFormat::from_path(&path), Some(DatasetFormat::Json));
        assert_eq!(
            default_scrape_path(Path::new("raw_data"), ExportFormat::Csv),
            PathBuf::from("raw_data/data_scrapees.csv")
        );
    }

    #[test]
    fn truncates_long_cells_on_char_boundaries() {
        assert_eq!(truncate("Chaussures élégantes", 10), "Chaussure…");
        assert_eq!(truncate("court", 10), "court");
    }

    #[test]
    fn export_writes_converted_copy() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(raw.join("listings.csv"), "Type,Prix\nVeste,25 000\n").unwrap();
        let out = dir.path().join("listings.json");

        export(&raw, "listings.csv", ExportFormat::Json, Some(out.clone())).unwrap();

        let loaded = load_dataset(&out).unwrap();
        assert_eq!(loaded.headers, vec!["Type", "Prix"]);
        assert_eq!(loaded.rows, vec![vec!["Veste", "25 000"]]);
    }

    #[test]
    fn export_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(raw.join("listings.json"), r#"[{"Type":"Veste","Prix":"25 000"}]"#).unwrap();
        let out = dir.path().join("exports/listings.xlsx");

        export(&raw, "listings.json", ExportFormat::Xlsx, Some(out.clone())).unwrap();

        let loaded = load_dataset(&out).unwrap();
        assert_eq!(loaded.headers, vec!["Type", "Prix"]);
        assert_eq!(loaded.rows, vec![vec!["Veste", "25 000"]]);
    }

    #[test]
    fn parses_xlsx_export_format() {
        let cli = Cli::try_parse_from(["ad-scout", "export", "listings.csv", "--format", "xlsx"]).unwrap();

        assert!(matches!(cli.command, Command::Export { format: ExportFormat::Xlsx, .. }));
    }
}
