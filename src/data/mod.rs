//! Data module - loading, normalization, caching and selection

mod cache;
mod dataset;
mod fetch;
mod loader;
mod normalizer;
mod processor;
mod schema;

pub use cache::{CacheError, Clock, DatasetCache, Expiry, SystemClock};
pub use dataset::Dataset;
pub use fetch::{Fetch, FetchError, FileFetcher, HttpFetcher, PLACES_COUNTY_CSV};
pub use loader::{DataLoader, LoadOptions, LoaderError};
pub use normalizer::Normalizer;
pub use processor::{DataProcessor, ProcessorError, Selection, TrendPoint};
pub use schema::{rename_table, CanonicalColumn, SchemaDescriptor};
