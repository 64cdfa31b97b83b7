//! Dataset Cache Module
//! Memoizes fetch → parse → normalize behind an explicit expiry policy.

use super::dataset::Dataset;
use super::fetch::{Fetch, FetchError};
use super::loader::{DataLoader, LoadOptions, LoaderError};
use super::normalizer::Normalizer;
use super::processor::ProcessorError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Normalize(#[from] ProcessorError),
}

/// Source of "now".
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// When a cached dataset stops being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Valid until [`DatasetCache::invalidate`] is called.
    #[default]
    Never,
    /// Refetched once this much time has passed since the last fetch.
    After(Duration),
}

struct Entry {
    dataset: Arc<Dataset>,
    fetched_at: DateTime<Utc>,
}

/// Holds at most one normalized dataset per validity window.
pub struct DatasetCache<F, C = SystemClock> {
    fetcher: F,
    clock: C,
    expiry: Expiry,
    options: LoadOptions,
    entry: Option<Entry>,
}

impl<F: Fetch> DatasetCache<F, SystemClock> {
    pub fn new(fetcher: F) -> Self {
        Self::with_clock(fetcher, SystemClock)
    }
}

impl<F: Fetch, C: Clock> DatasetCache<F, C> {
    pub fn with_clock(fetcher: F, clock: C) -> Self {
        Self {
            fetcher,
            clock,
            expiry: Expiry::Never,
            options: LoadOptions::default(),
            entry: None,
        }
    }

    pub fn expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Return the cached dataset, fetching it first if there is none or the
    /// entry has expired. A failed fetch leaves any previous entry in place.
    pub fn get(&mut self) -> Result<Arc<Dataset>, CacheError> {
        if let Some(entry) = &self.entry {
            if self.is_fresh(entry.fetched_at) {
                debug!("dataset cache hit");
                return Ok(Arc::clone(&entry.dataset));
            }
            debug!("dataset cache entry expired");
        }

        info!(source = %self.fetcher.describe(), "fetching dataset");
        let bytes = self.fetcher.fetch()?;
        let raw = DataLoader::read_csv_bytes(bytes, self.options)?;
        debug!(columns = ?DataLoader::get_columns(&raw), "raw headers");
        let dataset = Arc::new(Normalizer::normalize(&raw)?);
        info!(rows = dataset.height(), "dataset ready");

        self.entry = Some(Entry {
            dataset: Arc::clone(&dataset),
            fetched_at: self.clock.now(),
        });
        Ok(dataset)
    }

    /// Drop the cached dataset; the next [`get`](Self::get) refetches.
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("dataset cache invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| self.is_fresh(entry.fetched_at))
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>) -> bool {
        match self.expiry {
            Expiry::Never => true,
            Expiry::After(ttl) => self.clock.now() - fetched_at < ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const CSV: &[u8] = b"StateAbbr,CountyName,Measure,DataValue\nPA,Adams,Obesity,31.2\n";

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn start() -> Self {
            Self(Rc::new(Cell::new(
                DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            )))
        }

        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    fn counting_fetcher(calls: Rc<Cell<usize>>) -> impl Fn() -> Result<Vec<u8>, FetchError> {
        move || {
            calls.set(calls.get() + 1);
            Ok(CSV.to_vec())
        }
    }

    #[test]
    fn fetches_once_without_expiry() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = DatasetCache::new(counting_fetcher(calls.clone()));

        let first = cache.get().unwrap();
        let second = cache.get().unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.height(), 1);
    }

    #[test]
    fn refetches_after_ttl() {
        let calls = Rc::new(Cell::new(0));
        let clock = ManualClock::start();
        let mut cache = DatasetCache::with_clock(counting_fetcher(calls.clone()), clock.clone())
            .expiry(Expiry::After(Duration::hours(1)));

        cache.get().unwrap();
        clock.advance(Duration::minutes(59));
        cache.get().unwrap();
        assert_eq!(calls.get(), 1);

        clock.advance(Duration::minutes(2));
        assert!(!cache.is_cached());
        cache.get().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = DatasetCache::new(counting_fetcher(calls.clone()));

        cache.get().unwrap();
        cache.invalidate();
        assert!(!cache.is_cached());
        cache.get().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn fetch_error_propagates() {
        let mut cache = DatasetCache::new(|| Err::<Vec<u8>, _>(FetchError::Other("offline".into())));
        let err = cache.get().unwrap_err();
        assert!(matches!(err, CacheError::Fetch(_)));
        assert!(!cache.is_cached());
    }
}
