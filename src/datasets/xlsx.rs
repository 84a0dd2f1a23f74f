use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError as ReadError};
use rust_xlsxwriter::{Workbook, XlsxError as WriteError};
use std::path::Path;

/// Sheet name used for exported workbooks
pub const SHEET_NAME: &str = "Données";

#[derive(Debug, thiserror::Error)]
pub enum XlsxTableError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("workbook has no worksheet")]
    NoSheet,
}

/// Read the first worksheet. The first row is the header; every cell becomes text.
pub fn read_first_sheet(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), XlsxTableError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(XlsxTableError::NoSheet)??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let headers = rows.next().unwrap_or_default();

    Ok((headers, rows.collect()))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

/// Build a one-sheet workbook with the header row first. Cells are written as strings.
pub fn to_xlsx_bytes(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>, XlsxTableError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (r, row) in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)).enumerate() {
        let r = u32::try_from(r).map_err(|_| WriteError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| WriteError::RowColumnLimitError)?;
            worksheet.write_string(r, c, cell.as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn written_sheet_reads_back_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.xlsx");
        let headers = vec!["Type".to_string(), "Prix".to_string()];
        let rows = vec![vec!["Veste".to_string(), "25 000".to_string()]];

        std::fs::write(&path, to_xlsx_bytes(&headers, &rows).unwrap()).unwrap();
        let (read_headers, read_rows) = read_first_sheet(&path).unwrap();

        assert_eq!(read_headers, headers);
        assert_eq!(read_rows, rows);
    }

    #[test]
    fn numeric_cells_are_stringified() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cleaned.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "prix").unwrap();
        sheet.write_number(1, 0, 25000.0).unwrap();
        sheet.write_number(2, 0, 7500.5).unwrap();
        workbook.save(&path).unwrap();

        let (headers, rows) = read_first_sheet(&path).unwrap();

        assert_eq!(headers, vec!["prix"]);
        assert_eq!(rows, vec![vec!["25000"], vec!["7500.5"]]);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();

        assert!(matches!(read_first_sheet(&path), Err(XlsxTableError::Read(_))));
    }
}
