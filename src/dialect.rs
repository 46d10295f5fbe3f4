use std::fmt;

/// SQL generation helpers a connection carries for the application layer.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Quotes an identifier so it can be spliced into SQL text.
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Returns a statement yielding a single `count` column: 1 if the table
    /// exists, 0 otherwise. Takes the table name as its only parameter.
    fn table_exists_sql(&self) -> &str;

    /// Appends a row limit to a select statement.
    fn limit(&self, sql: &str, count: u64) -> String {
        format!("{} LIMIT {count}", sql.trim_end().trim_end_matches(';'))
    }
}

/// Dialect of the SQLite-compatible engine behind Bunny.net Database.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn table_exists_sql(&self) -> &str {
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?"
    }
}

#[cfg(test)]
mod tests {
    use super::{Dialect, SqliteDialect};

    #[test]
    fn quotes_identifiers() {
        assert_eq!(SqliteDialect.quote_identifier("users"), "\"users\"");
        assert_eq!(SqliteDialect.quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn limit_strips_trailing_semicolon() {
        assert_eq!(
            SqliteDialect.limit("SELECT * FROM users; ", 10),
            "SELECT * FROM users LIMIT 10"
        );
    }
}
