//! Lookup keys pairing a statement with the exact binds it was called with.

use std::fmt;

use crate::{protocol::Binds, Params};

/// Separates the statement from the encoded binds. SQL text never contains it.
const SEPARATOR: char = '\u{1f}';

/// Lookup key for a statement together with its bound parameters.
///
/// Two fingerprints are equal exactly when the SQL text is identical and the
/// parameters are equal value-for-value, in order and with the same types.
/// Floats compare numerically, so `-0.0` and `0.0` share a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(sql: &str, params: &Params) -> Self {
        let binds = serde_json::to_string(&Binds::from(params))
            .unwrap_or_else(|_| params.to_string());
        let mut key = String::with_capacity(sql.len() + 1 + binds.len());
        key.push_str(sql);
        key.push(SEPARATOR);
        key.push_str(&binds);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The statement half of the key.
    pub fn sql(&self) -> &str {
        self.0
            .rsplit_once(SEPARATOR)
            .map_or(self.0.as_str(), |(sql, _)| sql)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.replace(SEPARATOR, "::"))
    }
}
