//! Data Processor Module
//! Selection lists, filtering and series extraction over a normalized dataset.

use super::dataset::Dataset;
use super::schema::CanonicalColumn;
use polars::prelude::*;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Active filters; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub state: Option<String>,
    pub measure: Option<String>,
    pub year: Option<i64>,
    pub county: Option<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.measure.is_none() && self.year.is_none() && self.county.is_none()
    }
}

/// One point of a series plotted over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    pub x: i64,
    pub y: f64,
}

/// Handles selection and filtering operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Distinct non-null values of a column, sorted ascending.
    /// Empty when the column is absent.
    pub fn distinct_values(dataset: &Dataset, column: &str) -> Vec<String> {
        if !dataset.has_column(column) {
            return Vec::new();
        }

        dataset
            .frame()
            .column(column)
            .and_then(|c| c.cast(&DataType::String))
            .ok()
            .and_then(|c| {
                c.str().ok().map(|ca| {
                    ca.into_iter()
                        .flatten()
                        .map(str::to_string)
                        .collect::<BTreeSet<_>>()
                })
            })
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn available_states(dataset: &Dataset) -> Vec<String> {
        Self::distinct_values(dataset, CanonicalColumn::State.name())
    }

    pub fn available_measures(dataset: &Dataset) -> Vec<String> {
        Self::distinct_values(dataset, CanonicalColumn::Measure.name())
    }

    pub fn available_counties(dataset: &Dataset) -> Vec<String> {
        Self::distinct_values(dataset, CanonicalColumn::County.name())
    }

    /// Distinct non-null years, ascending.
    pub fn available_years(dataset: &Dataset) -> Vec<i64> {
        if !dataset.has(CanonicalColumn::Year) {
            return Vec::new();
        }

        dataset
            .frame()
            .column(CanonicalColumn::Year.name())
            .ok()
            .and_then(|c| {
                c.i64()
                    .ok()
                    .map(|ca| ca.into_iter().flatten().collect::<BTreeSet<i64>>())
            })
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }

    /// Keep rows matching every active filter. Filters on columns the dataset
    /// does not carry are skipped.
    pub fn filter(dataset: &Dataset, selection: &Selection) -> Result<Dataset, ProcessorError> {
        let mut predicates: Vec<Expr> = Vec::new();

        let text_filters = [
            (CanonicalColumn::State, &selection.state),
            (CanonicalColumn::Measure, &selection.measure),
            (CanonicalColumn::County, &selection.county),
        ];
        for (column, wanted) in text_filters {
            let Some(wanted) = wanted else { continue };
            if dataset.has(column) {
                predicates.push(
                    col(column.name())
                        .cast(DataType::String)
                        .eq(lit(wanted.as_str())),
                );
            } else {
                debug!(%column, "column absent, filter skipped");
            }
        }

        if let Some(year) = selection.year {
            if dataset.has(CanonicalColumn::Year) {
                predicates.push(col(CanonicalColumn::Year.name()).eq(lit(year)));
            } else {
                debug!("year column absent, filter skipped");
            }
        }

        let Some(predicate) = predicates.into_iter().reduce(|acc, e| acc.and(e)) else {
            return Ok(dataset.clone());
        };

        let filtered = dataset.frame().clone().lazy().filter(predicate).collect()?;
        debug!(before = dataset.height(), after = filtered.height(), "applied selection");
        Ok(dataset.with_frame(filtered))
    }

    /// `(x, y)` pairs with both sides present, sorted ascending by `x`.
    /// Empty when either column is absent.
    pub fn trend(dataset: &Dataset, x_col: &str, y_col: &str) -> Result<Vec<TrendPoint>, ProcessorError> {
        if !dataset.has_column(x_col) || !dataset.has_column(y_col) {
            return Ok(Vec::new());
        }

        let df = dataset.frame();
        let xs = df.column(x_col)?.cast(&DataType::Int64)?;
        let ys = df.column(y_col)?.cast(&DataType::Float64)?;

        let mut points: Vec<TrendPoint> = xs
            .i64()?
            .into_iter()
            .zip(ys.f64()?.into_iter())
            .filter_map(|(x, y)| match (x, y) {
                (Some(x), Some(y)) if !y.is_nan() => Some(TrendPoint { x, y }),
                _ => None,
            })
            .collect();

        points.sort_by_key(|p| p.x);
        Ok(points)
    }

    /// Whether a ranking report can be produced: both columns exist and at
    /// least one value is numeric.
    pub fn can_rank(dataset: &Dataset, group_col: &str, value_col: &str) -> bool {
        if !dataset.has_column(group_col) || !dataset.has_column(value_col) {
            return false;
        }

        dataset
            .frame()
            .column(value_col)
            .and_then(|c| c.cast(&DataType::Float64))
            .ok()
            .and_then(|c| {
                c.f64()
                    .ok()
                    .map(|ca| ca.into_iter().flatten().any(|v| !v.is_nan()))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Normalizer;

    fn sample() -> Dataset {
        let raw = df!(
            "StateAbbr" => &["PA", "PA", "PA", "OH", "OH"],
            "CountyName" => &["Adams", "Berks", "Adams", "Allen", "Butler"],
            "Measure" => &["Obesity", "Obesity", "Obesity", "Obesity", "Smoking"],
            "DataValue" => &[31.2, 29.8, 30.5, 33.0, 18.1],
            "Year" => &[2021i64, 2021, 2022, 2021, 2021],
        )
        .unwrap();
        Normalizer::normalize(&raw).unwrap()
    }

    #[test]
    fn lists_are_distinct_and_sorted() {
        let ds = sample();
        assert_eq!(DataProcessor::available_states(&ds), vec!["OH", "PA"]);
        assert_eq!(DataProcessor::available_measures(&ds), vec!["Obesity", "Smoking"]);
        assert_eq!(
            DataProcessor::available_counties(&ds),
            vec!["Adams", "Allen", "Berks", "Butler"]
        );
        assert_eq!(DataProcessor::available_years(&ds), vec![2021, 2022]);
    }

    #[test]
    fn lists_are_empty_for_absent_columns() {
        let raw = df!("DataValue" => &[1.0]).unwrap();
        let ds = Normalizer::normalize(&raw).unwrap();
        assert!(DataProcessor::available_states(&ds).is_empty());
        assert!(DataProcessor::available_years(&ds).is_empty());
    }

    #[test]
    fn filters_combine_with_and() {
        let ds = sample();
        let selection = Selection {
            state: Some("PA".into()),
            measure: Some("Obesity".into()),
            year: Some(2021),
            county: None,
        };
        let filtered = DataProcessor::filter(&ds, &selection).unwrap();
        assert_eq!(filtered.height(), 2);
        assert_eq!(DataProcessor::available_counties(&filtered), vec!["Adams", "Berks"]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let ds = sample();
        let selection = Selection {
            state: Some("ZZ".into()),
            ..Default::default()
        };
        let filtered = DataProcessor::filter(&ds, &selection).unwrap();
        assert!(filtered.is_empty());
        assert!(!DataProcessor::can_rank(&filtered, "county", "value"));
    }

    #[test]
    fn filter_on_absent_column_is_skipped() {
        let raw = df!("CountyName" => &["Adams"], "DataValue" => &[1.0]).unwrap();
        let ds = Normalizer::normalize(&raw).unwrap();
        let selection = Selection {
            year: Some(2021),
            state: Some("PA".into()),
            ..Default::default()
        };
        assert_eq!(DataProcessor::filter(&ds, &selection).unwrap().height(), 1);
    }

    #[test]
    fn trend_is_sorted_by_year() {
        let ds = sample();
        let adams = Selection {
            county: Some("Adams".into()),
            ..Default::default()
        };
        let view = DataProcessor::filter(&ds, &adams).unwrap();
        let points = DataProcessor::trend(&view, "year", "value").unwrap();
        assert_eq!(
            points,
            vec![TrendPoint { x: 2021, y: 31.2 }, TrendPoint { x: 2022, y: 30.5 }]
        );
    }

    #[test]
    fn can_rank_requires_both_columns() {
        let ds = sample();
        assert!(DataProcessor::can_rank(&ds, "county", "value"));
        assert!(!DataProcessor::can_rank(&ds, "location_name", "value"));
    }
}
