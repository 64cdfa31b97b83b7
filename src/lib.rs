//! PLACES Report - county health data ranking and Markdown export
//!
//! Normalizes CDC PLACES county exports, filters them by state, measure,
//! year and county, summarizes the values, and ranks counties into a
//! Markdown report.

pub mod config;
pub mod data;
pub mod report;
pub mod stats;
