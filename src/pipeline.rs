use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::Duration,
};

use reqwest::{header, StatusCode};
use tokio::{runtime::Runtime, time::sleep};

use crate::{
    protocol::{ExecuteRequest, ExecuteResponse, Outcome},
    ConnectionKind, ConnectionOptions, DatabaseConnection, Dialect, Error, Params, Result,
    ResultCursor, SqliteDialect, Value,
};

/// Formats a database ID into the canonical pipeline URL.
///
/// Example: `"abc123"` → `"https://abc123.lite.bunnydb.net/v2/pipeline"`
pub fn db_id_to_pipeline_url(db_id: &str) -> String {
    format!("https://{}.lite.bunnydb.net/v2/pipeline", db_id.trim())
}

/// Live connection to the Bunny.net Database SQL pipeline endpoint.
///
/// Calls block the current thread. Each connection drives its requests on a
/// private single-threaded tokio runtime, built on first use, so it must not
/// be called from inside another tokio runtime.
pub struct PipelineConnection {
    http: reqwest::Client,
    pipeline_url: String,
    token: String,
    options: ConnectionOptions,
    dialect: Arc<dyn Dialect>,
    last_insert_id: Mutex<Option<i64>>,
    runtime: OnceLock<Runtime>,
}

impl fmt::Debug for PipelineConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConnection")
            .field("pipeline_url", &self.pipeline_url)
            .field("token", &"<redacted>")
            .field("options", &self.options)
            .field("dialect", &self.dialect)
            .finish()
    }
}

impl PipelineConnection {
    /// Creates a connection with a raw authorization header value.
    ///
    /// Example: `"Bearer <token>"` or any custom scheme.
    pub fn new(pipeline_url: impl Into<String>, authorization: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            pipeline_url: pipeline_url.into(),
            token: authorization.into(),
            options: ConnectionOptions::default(),
            dialect: Arc::new(SqliteDialect),
            last_insert_id: Mutex::new(None),
            runtime: OnceLock::new(),
        }
    }

    /// Creates a connection from a bearer token.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn new_bearer(pipeline_url: impl Into<String>, token: impl AsRef<str>) -> Self {
        let authorization = normalize_bearer_authorization(token.as_ref());
        Self::new(pipeline_url, authorization)
    }

    /// Creates a connection from a **Bunny Database ID** and a bearer token.
    ///
    /// The pipeline URL is derived automatically:
    /// `https://<db_id>.lite.bunnydb.net/v2/pipeline`
    pub fn from_db_id(db_id: impl AsRef<str>, token: impl AsRef<str>) -> Self {
        let url = db_id_to_pipeline_url(db_id.as_ref());
        Self::new_bearer(url, token)
    }

    /// Creates a connection from environment variables.
    ///
    /// Reads:
    /// - `BUNNYDB_PIPELINE_URL` — full pipeline endpoint URL
    /// - `BUNNYDB_TOKEN` — access token (Bearer prefix optional)
    ///
    /// Returns an error if either variable is missing or empty.
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = std::env::var("BUNNYDB_PIPELINE_URL")
            .map_err(|_| "missing BUNNYDB_PIPELINE_URL environment variable".to_owned())?;
        let token = std::env::var("BUNNYDB_TOKEN")
            .map_err(|_| "missing BUNNYDB_TOKEN environment variable".to_owned())?;
        if url.trim().is_empty() {
            return Err("BUNNYDB_PIPELINE_URL is set but empty".to_owned());
        }
        if token.trim().is_empty() {
            return Err("BUNNYDB_TOKEN is set but empty".to_owned());
        }
        Ok(Self::new_bearer(url, token))
    }

    /// Applies connection options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ConnectionOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the default SQLite dialect.
    pub fn with_dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn pipeline_url(&self) -> &str {
        &self.pipeline_url
    }

    fn block_on<F: Future>(&self, future: F) -> Result<F::Output> {
        let runtime = match self.runtime.get() {
            Some(runtime) => runtime,
            None => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(Error::Runtime)?;
                self.runtime.get_or_init(|| runtime)
            }
        };
        Ok(runtime.block_on(future))
    }

    async fn run_single(&self, sql: &str, params: &Params, want_rows: bool) -> Result<Outcome> {
        let payload = ExecuteRequest::new(sql, params, want_rows)?;
        self.send_pipeline_with_retry(&payload)
            .await?
            .into_outcome()
    }

    async fn send_pipeline_with_retry(
        &self,
        payload: &ExecuteRequest<'_>,
    ) -> Result<ExecuteResponse> {
        let mut attempt = 0usize;
        loop {
            let response = self
                .http
                .post(&self.pipeline_url)
                .header(header::AUTHORIZATION, &self.token)
                .header(header::CONTENT_TYPE, "application/json")
                .timeout(Duration::from_millis(self.options.timeout_ms))
                .json(payload)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.map_err(Error::Transport)?;

                    if status.is_success() {
                        return serde_json::from_str::<ExecuteResponse>(&body).map_err(
                            |err| {
                                Error::Decode(format!(
                                    "invalid pipeline response JSON: {err}; body: {body}"
                                ))
                            },
                        );
                    }
                    if !should_retry_status(status) || attempt >= self.options.max_retries {
                        return Err(Error::Http {
                            status: status.as_u16(),
                            body,
                        });
                    }
                }
                Err(err) => {
                    if !should_retry_transport(&err) || attempt >= self.options.max_retries {
                        return Err(Error::Transport(err));
                    }
                }
            }

            self.wait_before_retry(attempt).await;
            attempt += 1;
        }
    }

    /// Exponential backoff before the next retry attempt.
    async fn wait_before_retry(&self, attempt: usize) {
        let exp = attempt.min(16) as u32;
        let multiplier = 1u64 << exp;
        let delay_ms = self.options.retry_backoff_ms.saturating_mul(multiplier);

        #[cfg(feature = "tracing")]
        tracing::debug!("retrying pipeline request after {} ms", delay_ms);

        sleep(Duration::from_millis(delay_ms)).await;
    }

    fn record_last_insert_id(&self, id: Option<i64>) {
        if id.is_some() {
            *self
                .last_insert_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = id;
        }
    }
}

impl DatabaseConnection for PipelineConnection {
    fn query(&self, sql: &str, params: Params) -> Result<ResultCursor> {
        let outcome = self.block_on(self.run_single(sql, &params, true))??;
        Ok(ResultCursor::new(sql, outcome.into_rows()?))
    }

    fn execute(&self, sql: &str, params: Params) -> Result<bool> {
        let outcome = self.block_on(self.run_single(sql, &params, false))??;
        self.record_last_insert_id(outcome.last_insert_id()?);
        Ok(true)
    }

    fn last_insert_id(&self) -> Result<Option<i64>> {
        Ok(*self
            .last_insert_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = self.dialect.table_exists_sql();
        let mut cursor = self.query(sql, Params::positional([Value::text(table)]))?;
        let count = cursor
            .fetch()
            .and_then(|row| row.get_index(0).and_then(Value::as_i64))
            .unwrap_or(0);
        Ok(count > 0)
    }

    fn dialect(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Real
    }
}

fn should_retry_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn should_retry_transport(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::{db_id_to_pipeline_url, normalize_bearer_authorization, PipelineConnection};
    use crate::{ConnectionKind, DatabaseConnection};

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("abc123"),
            "Bearer abc123".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR abc123"),
            "bEaReR abc123".to_owned()
        );
    }

    #[test]
    fn db_id_builds_pipeline_url() {
        assert_eq!(
            db_id_to_pipeline_url(" abc123 "),
            "https://abc123.lite.bunnydb.net/v2/pipeline"
        );
        let db = PipelineConnection::from_db_id("abc123", "token");
        assert_eq!(
            db.pipeline_url(),
            "https://abc123.lite.bunnydb.net/v2/pipeline"
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let db = PipelineConnection::new("https://db/v2/pipeline", "secret-token");
        let debug = format!("{db:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn reports_real_kind_without_connecting() {
        let db = PipelineConnection::new("https://db/v2/pipeline", "token");
        assert_eq!(db.kind(), ConnectionKind::Real);
        assert!(!db.is_mock());
        assert_eq!(db.last_insert_id().expect("no request needed"), None);
    }
}
