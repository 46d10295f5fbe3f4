/// Configures HTTP timeout and retry behavior of [`crate::PipelineConnection`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_backoff_ms: u64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 0,
            retry_backoff_ms: 250,
        }
    }
}

/// Where [`crate::MockConnection`] takes `last_insert_id` answers from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LastInsertIdSource {
    /// Next id from the FIFO sequence, in queue order, regardless of which
    /// insert ran. Tests that queue ids for several statements must execute
    /// them in the same order they were queued.
    #[default]
    Fifo,
    /// Id matched by the most recent insert executed through the mock.
    LastExecuted,
}

/// Configures [`crate::MockConnection`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MockOptions {
    pub last_insert_id: LastInsertIdSource,
}

impl MockOptions {
    pub fn with_last_insert_id(mut self, source: LastInsertIdSource) -> Self {
        self.last_insert_id = source;
        self
    }
}
