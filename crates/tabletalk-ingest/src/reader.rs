//! CSV reading for the upload boundary.

use std::io::Read;
use std::path::Path;

use tracing::info;

use tabletalk_core::error::{Result, TabletalkError};

use crate::dataset::Dataset;

/// File extensions accepted by the upload boundary. Checked before any
/// parsing begins.
const SUPPORTED_EXTENSIONS: [&str; 1] = ["csv"];

/// True when the path carries an accepted tabular extension
/// (case-insensitive).
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Parse a CSV file into a [`Dataset`].
///
/// The dataset name is the file stem. Fails with a `Parse` error on
/// unreadable structure or inconsistent column counts; nothing partial is
/// returned.
pub fn ingest_path(path: &Path) -> Result<Dataset> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            TabletalkError::Parse(format!("cannot derive dataset name from {}", path.display()))
        })?;

    let file = std::fs::File::open(path)
        .map_err(|e| TabletalkError::Parse(format!("cannot open {}: {}", path.display(), e)))?;

    ingest_reader(&name, file)
}

/// Parse CSV bytes from any reader into a [`Dataset`].
///
/// Rows with a column count that differs from the header are rejected; the
/// whole ingestion aborts. Empty cells come through as empty strings.
pub fn ingest_reader(name: &str, input: impl Read) -> Result<Dataset> {
    // Non-flexible: the csv crate rejects ragged rows for us.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| TabletalkError::Parse(format!("unreadable header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() {
        return Err(TabletalkError::Parse("no columns in header".to_string()));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| TabletalkError::Parse(format!("row {}: {}", line + 2, e)))?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    info!(
        dataset = name,
        columns = columns.len(),
        rows = rows.len(),
        "Parsed tabular upload"
    );

    Ok(Dataset {
        name: name.to_string(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LISTINGS: &str = "\
Address,Unit,Rent
12 Main St,1A,1800
12 Main St,2B,2400
99 Oak Ave,3,2100
";

    #[test]
    fn test_ingest_reader_basic() {
        let ds = ingest_reader("listings", LISTINGS.as_bytes()).unwrap();
        assert_eq!(ds.name, "listings");
        assert_eq!(ds.columns, vec!["Address", "Unit", "Rent"]);
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.rows[1], vec!["12 Main St", "2B", "2400"]);
    }

    #[test]
    fn test_ingest_reader_empty_cells() {
        let csv = "Address,Unit,Rent\n12 Main St,,1800\n";
        let ds = ingest_reader("listings", csv.as_bytes()).unwrap();
        assert_eq!(ds.rows[0][1], "");
    }

    #[test]
    fn test_ingest_reader_ragged_row_fails() {
        let csv = "Address,Unit,Rent\n12 Main St,1A\n";
        let result = ingest_reader("listings", csv.as_bytes());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), TabletalkError::Parse(_)));
    }

    #[test]
    fn test_ingest_reader_ragged_row_aborts_whole_ingestion() {
        // Good rows before the bad one must not leak out.
        let csv = "A,B\n1,2\n3,4\n5\n";
        assert!(ingest_reader("x", csv.as_bytes()).is_err());
    }

    #[test]
    fn test_ingest_reader_zero_rows_ok() {
        let csv = "Address,Unit,Rent\n";
        let ds = ingest_reader("listings", csv.as_bytes()).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.columns.len(), 3);
    }

    #[test]
    fn test_ingest_reader_trims_header_whitespace() {
        let csv = " Address , Unit \na,b\n";
        let ds = ingest_reader("x", csv.as_bytes()).unwrap();
        assert_eq!(ds.columns, vec!["Address", "Unit"]);
    }

    #[test]
    fn test_ingest_path_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(LISTINGS.as_bytes()).unwrap();

        let ds = ingest_path(&path).unwrap();
        assert_eq!(ds.name, "properties");
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn test_ingest_path_missing_file() {
        let result = ingest_path(Path::new("/nonexistent/file.csv"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), TabletalkError::Parse(_)));
    }

    #[test]
    fn test_has_supported_extension() {
        assert!(has_supported_extension(Path::new("data.csv")));
        assert!(has_supported_extension(Path::new("DATA.CSV")));
        assert!(!has_supported_extension(Path::new("data.xlsx")));
        assert!(!has_supported_extension(Path::new("data")));
        assert!(!has_supported_extension(Path::new("csv")));
    }

    #[test]
    fn test_quoted_cells_with_commas() {
        let csv = "Address,Rent\n\"12 Main St, Apt 4\",1800\n";
        let ds = ingest_reader("x", csv.as_bytes()).unwrap();
        assert_eq!(ds.rows[0][0], "12 Main St, Apt 4");
    }
}
