//! Ranker Module
//! Top-N / bottom-N rows of a value column.

use crate::data::Dataset;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub group: String,
    pub value: f64,
}

/// Ordered rows plus the column labels they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTable {
    pub group_label: String,
    pub value_label: String,
    pub entries: Vec<RankEntry>,
}

impl RankTable {
    fn new(group_label: &str, value_label: &str, entries: Vec<RankEntry>) -> Self {
        Self {
            group_label: group_label.to_string(),
            value_label: value_label.to_string(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.value)
    }
}

/// Highest and lowest `n` rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub n: usize,
    /// Descending by value.
    pub top: RankTable,
    /// Ascending by value.
    pub bottom: RankTable,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.bottom.is_empty()
    }
}

/// Ascending by value; equal values ordered by group key so output does not
/// depend on input row order.
fn ascending(a: &RankEntry, b: &RankEntry) -> Ordering {
    a.value
        .total_cmp(&b.value)
        .then_with(|| a.group.cmp(&b.group))
}

/// Descending by value; equal values still ordered by group key ascending.
fn descending(a: &RankEntry, b: &RankEntry) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| a.group.cmp(&b.group))
}

/// Rank `group_col` by `value_col`.
///
/// Rows with a null group or a null/NaN value are ignored. Group keys are not
/// deduplicated: a county present for several years is ranked once per row.
/// Fewer than `n` valid rows yields every valid row in both tables. A missing
/// column yields an empty ranking rather than an error.
pub fn rank(
    dataset: &Dataset,
    group_col: &str,
    value_col: &str,
    n: usize,
) -> Result<Ranking, RankError> {
    if !dataset.has_column(group_col) || !dataset.has_column(value_col) {
        warn!(group_col, value_col, "ranking column missing");
        return Ok(Ranking {
            n,
            top: RankTable::new(group_col, value_col, Vec::new()),
            bottom: RankTable::new(group_col, value_col, Vec::new()),
        });
    }

    let mut entries = valid_pairs(dataset.frame(), group_col, value_col)?;
    entries.sort_by(ascending);

    let take = n.min(entries.len());
    let bottom = entries[..take].to_vec();
    let mut top = entries[entries.len() - take..].to_vec();
    top.sort_by(descending);

    debug!(valid_rows = entries.len(), n, "ranked");
    Ok(Ranking {
        n,
        top: RankTable::new(group_col, value_col, top),
        bottom: RankTable::new(group_col, value_col, bottom),
    })
}

fn valid_pairs(df: &DataFrame, group_col: &str, value_col: &str) -> PolarsResult<Vec<RankEntry>> {
    let groups = df.column(group_col)?.cast(&DataType::String)?;
    let values = df.column(value_col)?.cast(&DataType::Float64)?;

    let entries = groups
        .str()?
        .into_iter()
        .zip(values.f64()?.into_iter())
        .filter_map(|(g, v)| match (g, v) {
            (Some(g), Some(v)) if !v.is_nan() => Some(RankEntry {
                group: g.to_string(),
                value: v,
            }),
            _ => None,
        })
        .collect();
    Ok(entries)
}
