//! Review search.
//!
//! Filtering runs over reviews that are already loaded; it never touches the
//! database. [`SearchDebouncer`] waits for a quiet period after the last input
//! before filtering, and a new input cancels the pending pass.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use riviu_common::config::SearchSettings;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Something that can be matched by the review search.
pub trait Searchable {
    /// Text fields the query is matched against.
    fn search_fields(&self) -> Vec<&str>;
}

/// Whether any searchable field contains `query`, ignoring case.
#[must_use]
pub fn matches_query<T: Searchable>(item: &T, query: &str) -> bool {
    let needle = query.to_lowercase();
    item.search_fields()
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Items matching `query`, in their original order.
///
/// An empty or blank query yields no results; callers show the full list instead.
/// Otherwise the query is matched as typed, surrounding whitespace included.
#[must_use]
pub fn filter_items<T: Searchable + Clone>(query: &str, items: &[T]) -> Vec<T> {
    if query.trim().is_empty() {
        return vec![];
    }

    items
        .iter()
        .filter(|item| matches_query(*item, query))
        .cloned()
        .collect()
}

/// Result of one completed search pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<T> {
    pub query: String,
    pub results: Vec<T>,
}

impl<T> Default for SearchOutcome<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: vec![],
        }
    }
}

/// Debounced search over a shared set of items.
pub struct SearchDebouncer<T> {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    tx: watch::Sender<SearchOutcome<T>>,
}

impl<T> SearchDebouncer<T>
where
    T: Searchable + Clone + Send + Sync + 'static,
{
    /// Create a debouncer that waits `delay` after the last input.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(SearchOutcome::default());
        Self {
            delay,
            pending: Mutex::new(None),
            tx,
        }
    }

    /// Create a debouncer with the configured quiet period.
    #[must_use]
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(settings.debounce())
    }

    /// Receiver that observes every completed search pass.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchOutcome<T>> {
        self.tx.subscribe()
    }

    /// Register a new query. Cancels any pass still waiting out its delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&self, query: impl Into<String>, items: Arc<Vec<T>>) {
        let query = query.into();
        let delay = self.delay;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let results = filter_items(&query, &items);
            debug!(query = %query, results = results.len(), "Search pass finished");
            tx.send_replace(SearchOutcome { query, results });
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel the pending pass, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl<T> Drop for SearchDebouncer<T> {
    fn drop(&mut self) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}
