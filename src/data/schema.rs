//! Canonical Schema Module
//! Column names used after normalization and the table that maps raw export
//! headers onto them.

use polars::prelude::*;
use std::collections::BTreeSet;
use std::fmt;

/// Canonical column produced by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalColumn {
    State,
    StateName,
    County,
    LocationName,
    Measure,
    MeasureId,
    Category,
    Value,
    Unit,
    ValueType,
    Year,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 11] = [
        CanonicalColumn::State,
        CanonicalColumn::StateName,
        CanonicalColumn::County,
        CanonicalColumn::LocationName,
        CanonicalColumn::Measure,
        CanonicalColumn::MeasureId,
        CanonicalColumn::Category,
        CanonicalColumn::Value,
        CanonicalColumn::Unit,
        CanonicalColumn::ValueType,
        CanonicalColumn::Year,
    ];

    /// Rows null in any of these are dropped during normalization.
    pub const ESSENTIAL: [CanonicalColumn; 4] = [
        CanonicalColumn::State,
        CanonicalColumn::County,
        CanonicalColumn::Measure,
        CanonicalColumn::Value,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CanonicalColumn::State => "state",
            CanonicalColumn::StateName => "state_name",
            CanonicalColumn::County => "county",
            CanonicalColumn::LocationName => "location_name",
            CanonicalColumn::Measure => "measure",
            CanonicalColumn::MeasureId => "measure_id",
            CanonicalColumn::Category => "category",
            CanonicalColumn::Value => "value",
            CanonicalColumn::Unit => "unit",
            CanonicalColumn::ValueType => "value_type",
            CanonicalColumn::Year => "year",
        }
    }

    /// Raw header spellings, in the order they are tried.
    pub fn source_names(self) -> &'static [&'static str] {
        match self {
            CanonicalColumn::State => &["StateAbbr"],
            CanonicalColumn::StateName => &["StateDesc"],
            CanonicalColumn::County => &["CountyName"],
            CanonicalColumn::LocationName => &["LocationName"],
            CanonicalColumn::Measure => &["Measure"],
            CanonicalColumn::MeasureId => &["MeasureId"],
            CanonicalColumn::Category => &["Category"],
            CanonicalColumn::Value => &["DataValue", "Data_Value"],
            CanonicalColumn::Unit => &["DataValueUnit", "Data_Value_Unit"],
            CanonicalColumn::ValueType => &["DataValueType", "Data_Value_Type"],
            CanonicalColumn::Year => &["Year"],
        }
    }

    /// Look up a canonical column by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flattened rename table: `(source, canonical)` pairs in application order.
pub fn rename_table() -> Vec<(&'static str, CanonicalColumn)> {
    CanonicalColumn::ALL
        .into_iter()
        .flat_map(|c| c.source_names().iter().map(move |s| (*s, c)))
        .collect()
}

/// Which canonical columns a normalized frame carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDescriptor {
    present: BTreeSet<CanonicalColumn>,
}

impl SchemaDescriptor {
    /// Inspect a frame's column names.
    pub fn from_frame(df: &DataFrame) -> Self {
        let present = df
            .get_column_names()
            .iter()
            .filter_map(|name| CanonicalColumn::from_name(name.as_str()))
            .collect();
        Self { present }
    }

    pub fn contains(&self, column: CanonicalColumn) -> bool {
        self.present.contains(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = CanonicalColumn> + '_ {
        self.present.iter().copied()
    }

    /// Essential columns present in this schema.
    pub fn essentials(&self) -> Vec<CanonicalColumn> {
        CanonicalColumn::ESSENTIAL
            .into_iter()
            .filter(|c| self.contains(*c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_table_lists_primary_alias_first() {
        let table = rename_table();
        let values: Vec<&str> = table
            .iter()
            .filter(|(_, c)| *c == CanonicalColumn::Value)
            .map(|(s, _)| *s)
            .collect();
        assert_eq!(values, vec!["DataValue", "Data_Value"]);
        assert_eq!(table.len(), 14);
    }

    #[test]
    fn descriptor_ignores_non_canonical_columns() -> PolarsResult<()> {
        let df = df!(
            "county" => &["A"],
            "value" => &[1.0],
            "LocationID" => &["42001"],
        )?;
        let schema = SchemaDescriptor::from_frame(&df);
        assert!(schema.contains(CanonicalColumn::County));
        assert!(schema.contains(CanonicalColumn::Value));
        assert!(!schema.contains(CanonicalColumn::Year));
        assert_eq!(schema.len(), 2);
        assert_eq!(
            schema.essentials(),
            vec![CanonicalColumn::County, CanonicalColumn::Value]
        );
        Ok(())
    }
}
