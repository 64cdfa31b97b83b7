//! CSV Data Loader Module
//! Reads raw PLACES CSV exports into a Polars DataFrame.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Rows scanned before the column types are fixed.
pub const INFER_SCHEMA_ROWS: usize = 10_000;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV contains no columns")]
    NoColumns,
}

/// Options applied when parsing a raw export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep only the first `n` data rows.
    pub limit_rows: Option<usize>,
}

/// Handles CSV parsing with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Parse CSV bytes already held in memory.
    pub fn read_csv_bytes(bytes: Vec<u8>, options: LoadOptions) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .with_ignore_errors(true)
            .with_n_rows(options.limit_rows)
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        if df.width() == 0 {
            return Err(LoaderError::NoColumns);
        }

        debug!(rows = df.height(), columns = df.width(), "parsed csv");
        Ok(df)
    }

    /// Read and parse a CSV file from disk.
    pub fn load_csv(path: &Path, options: LoadOptions) -> Result<DataFrame, LoaderError> {
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::read_csv_bytes(bytes, options)
    }

    /// Get list of column names.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "StateAbbr,CountyName,Measure,DataValue,Year\n\
                          PA,Adams,Obesity,31.2,2021\n\
                          PA,Berks,Obesity,29.8,2021\n\
                          PA,Centre,Obesity,n/a,2021\n";

    #[test]
    fn reads_headers_and_rows() {
        let df = DataLoader::read_csv_bytes(SAMPLE.as_bytes().to_vec(), LoadOptions::default())
            .unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(
            DataLoader::get_columns(&df),
            vec!["StateAbbr", "CountyName", "Measure", "DataValue", "Year"]
        );
    }

    #[test]
    fn limit_rows_truncates() {
        let options = LoadOptions {
            limit_rows: Some(2),
        };
        let df = DataLoader::read_csv_bytes(SAMPLE.as_bytes().to_vec(), options).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DataLoader::load_csv(Path::new("/nonexistent/places.csv"), LoadOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/places.csv"));
    }
}
