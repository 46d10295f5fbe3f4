//! `bunnydb-testkit` swaps a Bunny.net Database connection for a deterministic
//! mock during tests.
//!
//! Tests queue the rows a statement returns and the ids an insert generates,
//! keyed by the exact SQL text and its bound parameters:
//! - [`MockedDbTestCase::queue_db_result`]
//! - [`MockedDbTestCase::queue_insert_id`]
//!
//! [`MockedDbTestCase::set_up`] rebinds `"db"` in the [`Registry`] to a
//! [`MockConnection`] that answers from those expectations and fails with
//! [`Error::NoExpectationQueued`] / [`Error::NoInsertIdQueued`] on anything
//! it was not told about.

pub mod binder;
mod connection;
mod cursor;
mod dialect;
mod error;
mod fingerprint;
mod mock;
mod options;
mod params;
mod pipeline;
mod protocol;
pub mod registry;
mod row;
pub mod store;
pub mod test_case;
mod value;

pub use connection::{is_insert, ConnectionKind, DatabaseConnection};
pub use cursor::{FetchMode, ResultCursor};
pub use dialect::{Dialect, SqliteDialect};
pub use error::Error;
pub use fingerprint::Fingerprint;
pub use mock::MockConnection;
pub use options::{ConnectionOptions, LastInsertIdSource, MockOptions};
pub use params::Params;
pub use pipeline::{db_id_to_pipeline_url, PipelineConnection};
pub use registry::{Container, Factory, Registry};
pub use row::Row;
pub use store::ExpectationStore;
pub use test_case::{MockedDbTestCase, DB_SERVICE};
pub use value::Value;

pub type Result<T> = std::result::Result<T, Error>;
