//! Per-test harness that swaps the `"db"` connection for a mock.

use std::sync::Arc;

use crate::{
    binder, Container, DatabaseConnection, Error, ExpectationStore, MockConnection, MockOptions,
    Params, Registry, Result, Row,
};

/// Name the application resolves its database connection under.
pub const DB_SERVICE: &str = "db";

/// Test fixture owning a registry and the expectations its mock answers from.
///
/// Call [`MockedDbTestCase::set_up`] at the start of every test, then queue
/// what the code under test is expected to read and insert:
///
/// ```
/// use std::sync::Arc;
/// use bunnydb_testkit::{
///     Container, DatabaseConnection, MockedDbTestCase, PipelineConnection, Row, Value,
/// };
///
/// let mut container = Container::new();
/// container.set_instance("db", Arc::new(PipelineConnection::new("http://db", "token")));
///
/// let mut case = MockedDbTestCase::new(container);
/// case.set_up().unwrap();
/// case.queue_db_result(
///     "SELECT * FROM users WHERE id = ?",
///     [Value::integer(1)],
///     vec![Row::new([("id", Value::integer(1))])],
/// );
///
/// let db = case.db().unwrap();
/// assert_eq!(db.query("SELECT * FROM users WHERE id = ?", [Value::integer(1)].into())
///     .unwrap()
///     .num_rows(), 1);
/// ```
#[derive(Debug)]
pub struct MockedDbTestCase<R: Registry = Container> {
    registry: R,
    store: ExpectationStore,
    options: MockOptions,
}

impl<R: Registry> MockedDbTestCase<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            store: ExpectationStore::new(),
            options: MockOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MockOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses `store` instead of a private one, e.g. to share it with helpers.
    pub fn with_store(mut self, store: ExpectationStore) -> Self {
        self.store = store;
        self
    }

    /// Clears queued expectations and makes sure `"db"` resolves to a mock
    /// answering from this case's store.
    ///
    /// A mock left bound by another case, with a store of its own, is
    /// replaced; its dialect carries over.
    pub fn set_up(&mut self) -> Result<()> {
        self.store.reset();

        let db = self
            .registry
            .get(DB_SERVICE)
            .ok_or_else(|| Error::ServiceNotFound(DB_SERVICE.to_owned()))?;
        let answers_here = db
            .expectation_store()
            .is_some_and(|store| store.same_store(&self.store));
        if !answers_here {
            self.mock_db(DB_SERVICE)?;
        }
        Ok(())
    }

    /// Queues the rows a query for `sql` bound with `params` returns.
    pub fn queue_db_result<P: Into<Params>>(
        &mut self,
        sql: &str,
        params: P,
        rows: Vec<Row>,
    ) -> &mut Self {
        self.store.queue_result(sql, params, rows);
        self
    }

    /// Queues the id an insert of `sql` bound with `params` generates.
    pub fn queue_insert_id<P: Into<Params>>(
        &mut self,
        sql: &str,
        params: P,
        id: i64,
    ) -> &mut Self {
        self.store.queue_insert_id(sql, params, id);
        self
    }

    /// Binds a mock answering from this test's store under `name`.
    pub fn mock_db(&mut self, name: &str) -> Result<Arc<MockConnection>> {
        binder::mock_db(&mut self.registry, name, &self.store, &self.options)
    }

    /// Connection currently bound under `"db"`.
    pub fn db(&mut self) -> Result<Arc<dyn DatabaseConnection>> {
        self.registry
            .get(DB_SERVICE)
            .ok_or_else(|| Error::ServiceNotFound(DB_SERVICE.to_owned()))
    }

    pub fn store(&self) -> &ExpectationStore {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn set_registry(&mut self, registry: R) -> &mut Self {
        self.registry = registry;
        self
    }

    pub fn into_registry(self) -> R {
        self.registry
    }
}

impl Default for MockedDbTestCase<Container> {
    fn default() -> Self {
        Self::new(Container::new())
    }
}
