//! Raw and cleaned datasets on disk.
//!
//! Scrape exports land in the raw directory; externally cleaned files are
//! dropped into the cleaned directory and feed the dashboard. Every cell is
//! kept as a string, so reading and re-exporting a file never alters values.

pub mod csv;
pub mod json;
pub mod xlsx;

use crate::models::ListingRecord;
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_RAW_DIR: &str = "raw_data";
pub const DEFAULT_CLEANED_DIR: &str = "cleaned_data";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid record file: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: json::JsonTableError,
    },

    #[error("{} is not a readable workbook: {source}", .path.display())]
    Xlsx {
        path: PathBuf,
        #[source]
        source: xlsx::XlsxTableError,
    },

    #[error("could not serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not build workbook: {0}")]
    Workbook(#[from] xlsx::XlsxTableError),

    #[error("unsupported file format: {}", .path.display())]
    Unsupported { path: PathBuf },

    #[error("no dataset named '{name}' in {}", .dir.display())]
    NotFound { name: String, dir: PathBuf },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
    move |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// File formats recognised in the dataset directories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
    Xlsx,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Formats a dataset can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn ext(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }
}

/// The two dataset directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Bucket {
    /// Scraped, uncleaned data
    Raw,
    /// Cleaned data used by the dashboard
    Cleaned,
}

impl Bucket {
    pub fn formats(self) -> &'static [DatasetFormat] {
        match self {
            Self::Raw => &[DatasetFormat::Csv, DatasetFormat::Json, DatasetFormat::Xlsx],
            Self::Cleaned => &[DatasetFormat::Csv, DatasetFormat::Xlsx],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub name: String,
    pub path: PathBuf,
    pub format: DatasetFormat,
}

/// List the files in `dir` whose format is one of `formats`, sorted by name.
/// The directory is created when it does not exist yet.
pub fn list_datasets(dir: &Path, formats: &[DatasetFormat]) -> Result<Vec<DatasetFile>, DatasetError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(format) = DatasetFormat::from_path(&path) else {
            continue;
        };
        if !formats.contains(&format) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push(DatasetFile { name, path, format });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Found {} datasets in {}", files.len(), dir.display());
    Ok(files)
}

/// Look a dataset up by file name among those `list_datasets` would return
pub fn find_dataset(dir: &Path, name: &str, formats: &[DatasetFormat]) -> Result<DatasetFile, DatasetError> {
    list_datasets(dir, formats)?
        .into_iter()
        .find(|file| file.name == name)
        .ok_or_else(|| DatasetError::NotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })
}

/// A string-preserving table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_records(records: &[ListingRecord]) -> Self {
        Self {
            headers: ListingRecord::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(ListingRecord::to_row).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Index of the column whose trimmed header equals `name`, ignoring case
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// Cells of one column; short rows yield empty cells
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    pub fn to_csv_string(&self) -> String {
        csv::to_csv_string(&self.headers, &self.rows)
    }

    pub fn to_json_string(&self) -> Result<String, DatasetError> {
        Ok(json::to_json_string(&self.headers, &self.rows)?)
    }

    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>, DatasetError> {
        Ok(xlsx::to_xlsx_bytes(&self.headers, &self.rows)?)
    }

    /// File contents for `format`
    pub fn serialize(&self, format: ExportFormat) -> Result<Vec<u8>, DatasetError> {
        match format {
            ExportFormat::Csv => Ok(self.to_csv_string().into_bytes()),
            ExportFormat::Json => Ok(self.to_json_string()?.into_bytes()),
            ExportFormat::Xlsx => self.to_xlsx_bytes(),
        }
    }
}

/// Read a CSV, JSON or XLSX dataset. The first CSV or sheet row is the header.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let Some(format) = DatasetFormat::from_path(path) else {
        return Err(DatasetError::Unsupported {
            path: path.to_path_buf(),
        });
    };

    let dataset = match format {
        DatasetFormat::Xlsx => {
            let (headers, rows) = xlsx::read_first_sheet(path).map_err(|source| DatasetError::Xlsx {
                path: path.to_path_buf(),
                source,
            })?;
            Dataset { headers, rows }
        }
        DatasetFormat::Json => {
            let text = fs::read_to_string(path).map_err(io_error(path))?;
            let (headers, rows) = json::parse_records(&text).map_err(|source| DatasetError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            Dataset { headers, rows }
        }
        DatasetFormat::Csv => {
            let text = fs::read_to_string(path).map_err(io_error(path))?;
            let mut rows = csv::parse_rows(&text).into_iter();
            let headers = rows.next().unwrap_or_default();
            Dataset {
                headers,
                rows: rows.collect(),
            }
        }
    };

    debug!("Loaded {} rows from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Write `dataset` to `path`, creating parent directories as needed.
pub fn write_dataset(path: &Path, dataset: &Dataset, format: ExportFormat) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
    }

    let contents = dataset.serialize(format)?;
    fs::write(path, contents).map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(kind: &str, price: &str) -> ListingRecord {
        ListingRecord {
            kind: kind.into(),
            price: price.into(),
            address: "Dakar, Plateau".into(),
            image_url: format!("https://img.example/{kind}.jpg"),
        }
    }

    #[test]
    fn lists_only_bucket_formats_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b.csv", "a.json", "c.xlsx", "notes.txt", "d.CSV"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let raw: Vec<_> = list_datasets(dir.path(), Bucket::Raw.formats())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        let cleaned: Vec<_> = list_datasets(dir.path(), Bucket::Cleaned.formats())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();

        assert_eq!(raw, vec!["a.json", "b.csv", "c.xlsx", "d.CSV"]);
        assert_eq!(cleaned, vec!["b.csv", "c.xlsx", "d.CSV"]);
    }

    #[test]
    fn listing_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("raw_data");

        let files = list_datasets(&target, Bucket::Raw.formats()).unwrap();

        assert!(files.is_empty());
        assert!(target.is_dir());
    }

    #[test]
    fn find_reports_missing_name() {
        let dir = tempdir().unwrap();
        let err = find_dataset(dir.path(), "absent.csv", Bucket::Raw.formats()).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn csv_export_loads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/listings.csv");
        let dataset = Dataset::from_records(&[record("Chemise", "12 000"), record("Veste", "25 000")]);

        write_dataset(&path, &dataset, ExportFormat::Csv).unwrap();
        let loaded = load_dataset(&path).unwrap();

        assert_eq!(loaded, dataset);
    }

    #[test]
    fn json_export_loads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let dataset = Dataset::from_records(&[record("Chemise", "12 000")]);

        write_dataset(&path, &dataset, ExportFormat::Json).unwrap();
        let loaded = load_dataset(&path).unwrap();

        assert_eq!(loaded.headers, vec!["Type", "Prix", "Adresse", "Image"]);
        assert_eq!(loaded, dataset);
    }

    #[test]
    fn xlsx_export_loads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/listings.xlsx");
        let dataset = Dataset::from_records(&[record("Chemise", "12 000"), record("Veste", "25 000")]);

        write_dataset(&path, &dataset, ExportFormat::Xlsx).unwrap();
        let loaded = load_dataset(&path).unwrap();

        assert_eq!(loaded, dataset);
    }

    #[test]
    fn corrupt_xlsx_is_reported_with_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        fs::write(&path, b"PK").unwrap();

        match load_dataset(&path) {
            Err(DatasetError::Xlsx { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected workbook error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "x").unwrap();

        assert!(matches!(load_dataset(&path), Err(DatasetError::Unsupported { .. })));
    }

    #[test]
    fn column_lookup_ignores_case_and_padding() {
        let dataset = Dataset {
            headers: vec![" Prix ".into(), "type".into()],
            rows: vec![vec!["100".into(), "a".into()], vec!["200".into()]],
        };

        assert_eq!(dataset.column("prix"), Some(vec!["100", "200"]));
        assert_eq!(dataset.column("TYPE"), Some(vec!["a", ""]));
        assert_eq!(dataset.column("adresse"), None);
    }

    #[test]
    fn head_is_clamped() {
        let dataset = Dataset::from_records(&[record("A", "1")]);
        assert_eq!(dataset.head(5).len(), 1);
    }
}
