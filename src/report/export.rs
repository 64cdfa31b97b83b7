//! Report Export Module
//! Builds a report from a selection and writes it out as Markdown.

use super::markdown::{Report, DEFAULT_PRECISION};
use super::ranker::{rank, RankError, DEFAULT_TOP_N};
use super::sanitize::sanitize_filename;
use crate::data::{CanonicalColumn, DataProcessor, Dataset};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const MARKDOWN_MIME: &str = "text/markdown";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Not enough fields to generate a ranking report for this selection")]
    InsufficientData,
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What to put in a report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub state: String,
    pub measure: String,
    pub year: Option<i64>,
    pub notes: String,
    pub group_col: String,
    pub value_col: String,
    pub top_n: usize,
    pub precision: usize,
}

impl ReportRequest {
    pub fn new(state: impl Into<String>, measure: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            measure: measure.into(),
            year: None,
            notes: String::new(),
            group_col: CanonicalColumn::County.name().to_string(),
            value_col: CanonicalColumn::Value.name().to_string(),
            top_n: DEFAULT_TOP_N,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// A rendered report ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `PLACES_<state>_<measure>[_<year>].md`
pub fn report_filename(state: &str, measure: &str, year: Option<i64>) -> String {
    let mut name = format!(
        "PLACES_{}_{}",
        sanitize_filename(state),
        sanitize_filename(measure)
    );
    if let Some(year) = year {
        name.push_str(&format!("_{}", year));
    }
    name.push_str(".md");
    name
}

/// Rank `view` and wrap the result in a [`Report`]. `view` should already be
/// filtered to the requested state/measure/year.
pub fn build_report(
    view: &Dataset,
    request: &ReportRequest,
    generated_at: NaiveDateTime,
) -> Result<Report, ExportError> {
    if !DataProcessor::can_rank(view, &request.group_col, &request.value_col) {
        return Err(ExportError::InsufficientData);
    }

    let ranking = rank(view, &request.group_col, &request.value_col, request.top_n)?;
    Ok(Report::new(
        request.state.clone(),
        request.measure.clone(),
        request.year,
        ranking,
        request.notes.clone(),
        generated_at,
    )
    .with_precision(request.precision))
}

impl Report {
    pub fn file_name(&self) -> String {
        report_filename(&self.state, &self.measure, self.year)
    }

    pub fn to_download(&self) -> Download {
        Download {
            file_name: self.file_name(),
            mime: MARKDOWN_MIME,
            bytes: self.render().into_bytes(),
        }
    }
}

/// Write the report into `dir`, creating it if needed. Returns the path.
pub fn save_report(report: &Report, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let path = dir.join(report.file_name());
    fs::write(&path, report.render()).map_err(io_error(&path))?;

    info!(path = %path.display(), "report saved");
    Ok(path)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.display().to_string();
    move |source| ExportError::Io { path, source }
}
