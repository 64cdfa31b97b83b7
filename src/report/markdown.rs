//! Markdown Report Module
//! Renders a ranking into the PLACES auto-report document.

use super::ranker::{RankTable, Ranking};
use chrono::NaiveDateTime;

/// Decimal places used for values in rendered tables.
pub const DEFAULT_PRECISION: usize = 2;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const SUMMARY: &str = "This report ranks counties by the selected PLACES measure. \
Use it to quickly identify places with the highest and lowest estimates, then follow up \
with local context, uncertainty, and additional indicators.";

const NOTES_PLACEHOLDER: &str = "- (Add your interpretation here. What patterns do you notice? \
What would you investigate next?)";

const LIMITATIONS: [&str; 3] = [
    "PLACES provides model-based estimates; values may include uncertainty.",
    "Rankings can change based on year availability, missing data, and measure definitions.",
    "Pair this report with other sources and local context before making decisions.",
];

/// A generated report. Rendering is deterministic for a fixed `generated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub state: String,
    pub measure: String,
    pub year: Option<i64>,
    pub ranking: Ranking,
    pub notes: String,
    pub generated_at: NaiveDateTime,
    pub precision: usize,
}

impl Report {
    pub fn new(
        state: impl Into<String>,
        measure: impl Into<String>,
        year: Option<i64>,
        ranking: Ranking,
        notes: impl Into<String>,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            state: state.into(),
            measure: measure.into(),
            year,
            ranking,
            notes: notes.into(),
            generated_at,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn render(&self) -> String {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "All available".to_string());
        let notes = if self.notes.trim().is_empty() {
            NOTES_PLACEHOLDER
        } else {
            self.notes.as_str()
        };
        let n = self.ranking.n;

        let mut md = String::new();
        md.push_str("# PLACES Auto-Report\n\n");
        // Two trailing spaces force a Markdown line break
        md.push_str(&format!("**State:** {}  \n", self.state));
        md.push_str(&format!("**Measure:** {}  \n", self.measure));
        md.push_str(&format!("**Year:** {}\n\n", year));
        md.push_str(&format!(
            "**Generated:** {}\n\n",
            self.generated_at.format(TIMESTAMP_FORMAT)
        ));

        md.push_str("## Summary\n");
        md.push_str(SUMMARY);
        md.push_str("\n\n");

        md.push_str(&format!("## Top {} Counties (Highest Values)\n", n));
        md.push_str(&markdown_table(&self.ranking.top, self.precision));
        md.push('\n');

        md.push_str(&format!("## Bottom {} Counties (Lowest Values)\n", n));
        md.push_str(&markdown_table(&self.ranking.bottom, self.precision));
        md.push('\n');

        md.push_str("## Notes / Interpretation\n");
        md.push_str(notes);
        md.push_str("\n\n");

        md.push_str("## Limitations\n");
        for line in LIMITATIONS {
            md.push_str("- ");
            md.push_str(line);
            md.push('\n');
        }
        md
    }
}

/// Pipe table with a left-aligned key column and a right-aligned value column.
pub fn markdown_table(table: &RankTable, precision: usize) -> String {
    if table.is_empty() {
        return "_No rows._\n".to_string();
    }

    let rows: Vec<(String, String)> = table
        .entries
        .iter()
        .map(|e| (escape_cell(&e.group), format!("{:.*}", precision, e.value)))
        .collect();

    let key_w = rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .chain(std::iter::once(table.group_label.chars().count()))
        .max()
        .unwrap_or(0);
    let val_w = rows
        .iter()
        .map(|(_, v)| v.chars().count())
        .chain(std::iter::once(table.value_label.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "| {:<kw$} | {:>vw$} |\n",
        table.group_label,
        table.value_label,
        kw = key_w,
        vw = val_w
    ));
    out.push_str(&format!(
        "|:{}|{}:|\n",
        "-".repeat(key_w + 1),
        "-".repeat(val_w + 1)
    ));
    for (key, value) in &rows {
        out.push_str(&format!(
            "| {:<kw$} | {:>vw$} |\n",
            key,
            value,
            kw = key_w,
            vw = val_w
        ));
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
