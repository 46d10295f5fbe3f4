//! Queued expectations shared between a test case and the mock it installs.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{Fingerprint, Params, Row};

#[derive(Debug, Default)]
struct Expectations {
    results: HashMap<Fingerprint, Vec<Row>>,
    insert_ids: HashMap<Fingerprint, i64>,
    fifo: VecDeque<i64>,
    last_insert_id: Option<i64>,
}

/// Queued query results and insert ids, keyed by [`Fingerprint`].
///
/// Cloning yields another handle to the same expectations. Each test should
/// own its own store; nothing here is process-global.
#[derive(Clone, Debug, Default)]
pub struct ExpectationStore {
    inner: Arc<Mutex<Expectations>>,
}

impl ExpectationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `rows` for `sql` bound with `params`, replacing any earlier entry.
    pub fn queue_result<P: Into<Params>>(&self, sql: &str, params: P, rows: Vec<Row>) {
        let key = Fingerprint::new(sql, &params.into());
        self.lock().results.insert(key, rows);
    }

    /// Queues `id` for the insert `sql` bound with `params`, replacing any
    /// earlier entry. The id is also appended to the FIFO sequence.
    pub fn queue_insert_id<P: Into<Params>>(&self, sql: &str, params: P, id: i64) {
        let key = Fingerprint::new(sql, &params.into());
        let mut expectations = self.lock();
        expectations.insert_ids.insert(key, id);
        expectations.fifo.push_back(id);
    }

    pub fn resolve_result(&self, sql: &str, params: &Params) -> Option<Vec<Row>> {
        self.lock()
            .results
            .get(&Fingerprint::new(sql, params))
            .cloned()
    }

    pub fn resolve_insert_id(&self, sql: &str, params: &Params) -> Option<i64> {
        self.lock()
            .insert_ids
            .get(&Fingerprint::new(sql, params))
            .copied()
    }

    /// Dequeues the oldest queued insert id, whatever statement it was
    /// queued for. Fingerprint entries are left untouched.
    pub fn pop_fifo_insert_id(&self) -> Option<i64> {
        self.lock().fifo.pop_front()
    }

    /// Clears every expectation and the recorded last insert id.
    pub fn reset(&self) {
        let mut expectations = self.lock();
        *expectations = Expectations::default();

        #[cfg(feature = "tracing")]
        tracing::debug!("expectation store reset");
    }

    pub fn pending_results(&self) -> usize {
        self.lock().results.len()
    }

    pub fn pending_insert_ids(&self) -> usize {
        self.lock().fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        let expectations = self.lock();
        expectations.results.is_empty()
            && expectations.insert_ids.is_empty()
            && expectations.fifo.is_empty()
    }

    /// Whether `other` is a handle to these same expectations.
    pub fn same_store(&self, other: &ExpectationStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn record_last_insert_id(&self, id: i64) {
        self.lock().last_insert_id = Some(id);
    }

    pub(crate) fn last_recorded_insert_id(&self) -> Option<i64> {
        self.lock().last_insert_id
    }

    // Poisoned locks are recovered; the data stays consistent between calls.
    fn lock(&self) -> MutexGuard<'_, Expectations> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
