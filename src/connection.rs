use std::{fmt, sync::Arc};

use crate::{Dialect, ExpectationStore, Params, Result, ResultCursor};

/// Distinguishes a live connection from the test double standing in for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    Real,
    Mock,
}

/// The database operations the application layer relies on.
///
/// [`crate::PipelineConnection`] talks to Bunny.net Database;
/// [`crate::MockConnection`] answers from queued expectations.
pub trait DatabaseConnection: fmt::Debug + Send + Sync {
    /// Runs a row-returning statement.
    fn query(&self, sql: &str, params: Params) -> Result<ResultCursor>;

    /// Runs a statement for its side effects.
    fn execute(&self, sql: &str, params: Params) -> Result<bool>;

    /// Id generated by an insert, if any.
    fn last_insert_id(&self) -> Result<Option<i64>>;

    fn table_exists(&self, table: &str) -> Result<bool>;

    fn dialect(&self) -> Arc<dyn Dialect>;

    fn kind(&self) -> ConnectionKind;

    fn is_mock(&self) -> bool {
        self.kind() == ConnectionKind::Mock
    }

    /// Store a mock answers from; `None` for real connections.
    fn expectation_store(&self) -> Option<&ExpectationStore> {
        None
    }
}

/// Returns true for statements whose first keyword is `INSERT`, in any case.
pub fn is_insert(sql: &str) -> bool {
    sql.split_whitespace()
        .next()
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("insert"))
}
