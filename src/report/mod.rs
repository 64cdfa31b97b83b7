//! Report module - ranking, Markdown rendering and export

mod export;
mod markdown;
mod ranker;
mod sanitize;

pub use export::{
    build_report, report_filename, save_report, Download, ExportError, ReportRequest,
    MARKDOWN_MIME,
};
pub use markdown::{markdown_table, Report, DEFAULT_PRECISION, TIMESTAMP_FORMAT};
pub use ranker::{rank, RankEntry, RankError, RankTable, Ranking, DEFAULT_TOP_N};
pub use sanitize::{sanitize_filename, MAX_FILENAME_CHARS};
