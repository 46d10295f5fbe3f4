use crate::Params;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read query was issued that no queued result matches.
    #[error("No DB result queued for: {sql}\nBind: {params}")]
    NoExpectationQueued { sql: String, params: Params },
    /// An insert was executed that no queued insert id matches.
    #[error("No insert ID queued for: {sql}\nBind: {params}")]
    NoInsertIdQueued { sql: String, params: Params },
    /// Nothing is bound under the requested registry name.
    #[error("no service registered under '{0}'")]
    ServiceNotFound(String),
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// SQL/pipeline error returned by Bunny.net API.
    #[error("pipeline error at request {request_index}: {message}")]
    Pipeline {
        /// Index of the failing request in the pipeline payload.
        request_index: usize,
        /// Error message text from upstream API.
        message: String,
        /// Optional engine-specific error code.
        code: Option<String>,
    },
    /// Response decoding or protocol-shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
    /// The blocking runtime behind the real connection could not be built.
    #[error("runtime error: {0}")]
    Runtime(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use crate::{Error, Params, Value};

    #[test]
    fn miss_message_names_statement_and_binds() {
        let err = Error::NoExpectationQueued {
            sql: "SELECT * FROM users WHERE id = ?".to_owned(),
            params: Params::positional([Value::integer(2)]),
        };
        let message = err.to_string();
        assert!(message.contains("SELECT * FROM users WHERE id = ?"));
        assert!(message.contains("Bind: [2]"));
    }

    #[test]
    fn insert_miss_message_names_statement() {
        let err = Error::NoInsertIdQueued {
            sql: "INSERT INTO users (name) VALUES (?)".to_owned(),
            params: Params::positional([Value::text("Bob")]),
        };
        assert_eq!(
            err.to_string(),
            "No insert ID queued for: INSERT INTO users (name) VALUES (?)\nBind: [\"Bob\"]"
        );
    }
}
