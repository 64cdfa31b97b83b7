//! Normalized dataset wrapper.

use super::schema::{CanonicalColumn, SchemaDescriptor};
use polars::prelude::*;

/// An immutable, normalized table of PLACES observations.
///
/// The frame always uses canonical column names for every column the
/// normalizer recognized; unrecognized columns are carried through untouched.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    schema: SchemaDescriptor,
}

impl Dataset {
    pub(crate) fn from_parts(frame: DataFrame, schema: SchemaDescriptor) -> Self {
        Self { frame, schema }
    }

    /// Derive a view that keeps this dataset's schema.
    pub(crate) fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            frame,
            schema: self.schema.clone(),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has(&self, column: CanonicalColumn) -> bool {
        self.schema.contains(column)
    }

    /// Presence check by name. Canonical names are answered from the schema
    /// descriptor, anything else from the frame itself.
    pub fn has_column(&self, name: &str) -> bool {
        match CanonicalColumn::from_name(name) {
            Some(column) => self.has(column),
            None => self.frame.column(name).is_ok(),
        }
    }
}
