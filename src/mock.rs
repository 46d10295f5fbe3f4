use std::sync::Arc;

use crate::{
    connection::is_insert, ConnectionKind, DatabaseConnection, Dialect, Error,
    ExpectationStore, LastInsertIdSource, MockOptions, Params, Result, ResultCursor,
};

/// Connection double answering from an [`ExpectationStore`].
///
/// Reads and inserts must have been queued; any other statement succeeds
/// without touching the store, and every table exists.
#[derive(Clone, Debug)]
pub struct MockConnection {
    store: ExpectationStore,
    dialect: Arc<dyn Dialect>,
    options: MockOptions,
}

impl MockConnection {
    pub fn new(store: ExpectationStore, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            store,
            dialect,
            options: MockOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MockOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &ExpectationStore {
        &self.store
    }

    /// Whether this mock answers from `store`.
    pub fn shares_store(&self, store: &ExpectationStore) -> bool {
        self.store.same_store(store)
    }

    pub fn options(&self) -> &MockOptions {
        &self.options
    }
}

impl DatabaseConnection for MockConnection {
    fn query(&self, sql: &str, params: Params) -> Result<ResultCursor> {
        match self.store.resolve_result(sql, &params) {
            Some(rows) => Ok(ResultCursor::new(sql, rows)),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%sql, %params, "no DB result queued");

                Err(Error::NoExpectationQueued {
                    sql: sql.to_owned(),
                    params,
                })
            }
        }
    }

    fn execute(&self, sql: &str, params: Params) -> Result<bool> {
        if !is_insert(sql) {
            return Ok(true);
        }

        match self.store.resolve_insert_id(sql, &params) {
            Some(id) => {
                self.store.record_last_insert_id(id);
                Ok(true)
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%sql, %params, "no insert id queued");

                Err(Error::NoInsertIdQueued {
                    sql: sql.to_owned(),
                    params,
                })
            }
        }
    }

    fn last_insert_id(&self) -> Result<Option<i64>> {
        Ok(match self.options.last_insert_id {
            LastInsertIdSource::Fifo => self.store.pop_fifo_insert_id(),
            LastInsertIdSource::LastExecuted => self.store.last_recorded_insert_id(),
        })
    }

    fn table_exists(&self, _table: &str) -> Result<bool> {
        Ok(true)
    }

    fn dialect(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Mock
    }

    fn expectation_store(&self) -> Option<&ExpectationStore> {
        Some(&self.store)
    }
}
