//! Normalizer Module
//! Maps raw export headers onto the canonical schema, coerces numeric columns
//! and drops rows missing essential fields.

use super::dataset::Dataset;
use super::processor::ProcessorError;
use super::schema::{rename_table, CanonicalColumn, SchemaDescriptor};
use polars::prelude::*;
use tracing::debug;

pub struct Normalizer;

impl Normalizer {
    /// Produce a canonical [`Dataset`] from a raw frame. The input is left
    /// untouched; running this on an already-normalized frame is a no-op.
    pub fn normalize(raw: &DataFrame) -> Result<Dataset, ProcessorError> {
        let mut df = raw.clone();

        Self::apply_renames(&mut df)?;
        Self::coerce_numeric(&mut df)?;

        let schema = SchemaDescriptor::from_frame(&df);
        let df = Self::drop_incomplete(df, &schema)?;

        debug!(
            raw_rows = raw.height(),
            rows = df.height(),
            canonical_columns = schema.len(),
            "normalized dataset"
        );
        Ok(Dataset::from_parts(df, schema))
    }

    /// Rename source headers, never overwriting a canonical column that is
    /// already there.
    fn apply_renames(df: &mut DataFrame) -> PolarsResult<()> {
        for (source, canonical) in rename_table() {
            let target = canonical.name();
            if df.column(source).is_ok() && df.column(target).is_err() {
                df.rename(source, target.into())?;
            }
        }
        Ok(())
    }

    fn coerce_numeric(df: &mut DataFrame) -> PolarsResult<()> {
        let value_name = CanonicalColumn::Value.name();
        if let Ok(value) = df.column(value_name) {
            // Non-strict cast: unparseable entries become null. A literal
            // "NaN" parses, so it is nulled here as missing.
            let value = value.cast(&DataType::Float64)?;
            let value: Float64Chunked = value
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect();
            df.with_column(value.with_name(value_name.into()).into_series())?;
        }

        let year_name = CanonicalColumn::Year.name();
        if let Ok(year) = df.column(year_name) {
            // Via Float64 so "2021.0" style exports still parse; fractional
            // years are null rather than truncated
            let year = year.cast(&DataType::Float64)?;
            let year: Int64Chunked = year
                .f64()?
                .into_iter()
                .map(|v| v.filter(|y| y.fract() == 0.0).map(|y| y as i64))
                .collect();
            df.with_column(year.with_name(year_name.into()).into_series())?;
        }
        Ok(())
    }

    fn drop_incomplete(df: DataFrame, schema: &SchemaDescriptor) -> PolarsResult<DataFrame> {
        let predicate = schema
            .essentials()
            .into_iter()
            .map(|c| col(c.name()).is_not_null())
            .reduce(|acc, e| acc.and(e));

        match predicate {
            Some(predicate) => df.lazy().filter(predicate).collect(),
            None => Ok(df),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_export() -> DataFrame {
        df!(
            "StateAbbr" => &[Some("PA"), Some("PA"), Some("PA"), None],
            "CountyName" => &[Some("Adams"), Some("Berks"), Some("Centre"), Some("Dauphin")],
            "Measure" => &["Obesity", "Obesity", "Obesity", "Obesity"],
            "DataValue" => &[Some("31.2"), Some("abc"), Some("27"), Some("30.0")],
            "Year" => &[Some("2021"), Some("n/a"), None, Some("2021")],
        )
        .unwrap()
    }

    #[test]
    fn renames_coerces_and_drops() {
        let dataset = Normalizer::normalize(&raw_export()).unwrap();
        let df = dataset.frame();

        let names = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["state", "county", "measure", "value", "year"]);

        // "abc" coerces to null and is then dropped; the null state is dropped.
        assert_eq!(df.height(), 2);
        let values: Vec<Option<f64>> = df.column("value").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(31.2), Some(27.0)]);

        let years: Vec<Option<i64>> = df.column("year").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2021), None]);
    }

    #[test]
    fn nan_value_counts_as_missing() {
        let raw = df!(
            "StateAbbr" => &["PA", "PA", "PA"],
            "CountyName" => &["A", "B", "C"],
            "Measure" => &["M", "M", "M"],
            "DataValue" => &["NaN", "5", "x"],
        )
        .unwrap();
        let dataset = Normalizer::normalize(&raw).unwrap();

        assert_eq!(dataset.height(), 1);
        let counties: Vec<Option<&str>> = dataset.frame().column("county").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(counties, vec![Some("B")]);
    }

    #[test]
    fn fractional_year_is_null() {
        let raw = df!(
            "Year" => &["2021.0", "2021.7", "2022"],
        )
        .unwrap();
        let dataset = Normalizer::normalize(&raw).unwrap();
        let years: Vec<Option<i64>> = dataset.frame().column("year").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2021), None, Some(2022)]);
    }

    #[test]
    fn does_not_clobber_existing_canonical_column() {
        let raw = df!(
            "value" => &[1.0, 2.0],
            "DataValue" => &[100.0, 200.0],
        )
        .unwrap();
        let dataset = Normalizer::normalize(&raw).unwrap();
        let df = dataset.frame();

        assert!(df.column("DataValue").is_ok());
        let values: Vec<Option<f64>> = df.column("value").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn secondary_alias_used_when_primary_missing() {
        let raw = df!(
            "Data_Value" => &["4.5"],
            "Data_Value_Unit" => &["%"],
        )
        .unwrap();
        let dataset = Normalizer::normalize(&raw).unwrap();
        assert!(dataset.has(CanonicalColumn::Value));
        assert!(dataset.has(CanonicalColumn::Unit));
        assert!(!dataset.has(CanonicalColumn::County));
    }

    #[test]
    fn no_essential_columns_keeps_every_row() {
        let raw = df!(
            "Category" => &[None, Some("Health Outcomes")],
            "Year" => &[Some(2020i64), None],
        )
        .unwrap();
        let dataset = Normalizer::normalize(&raw).unwrap();
        assert_eq!(dataset.height(), 2);
    }

    #[test]
    fn input_frame_is_not_mutated() {
        let raw = raw_export();
        let _ = Normalizer::normalize(&raw).unwrap();
        assert!(raw.column("StateAbbr").is_ok());
        assert_eq!(raw.height(), 4);
    }

    #[test]
    fn normalizing_twice_is_idempotent() {
        let once = Normalizer::normalize(&raw_export()).unwrap();
        let twice = Normalizer::normalize(once.frame()).unwrap();
        assert!(once.frame().equals_missing(twice.frame()));
        assert_eq!(once.schema(), twice.schema());
    }
}
