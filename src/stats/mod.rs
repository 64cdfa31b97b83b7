//! Stats module - descriptive statistics

mod calculator;

pub use calculator::{StatsCalculator, ValueSummary, CONFIDENCE_LEVEL};
