//! JSON exchanged with the pipeline endpoint for one statement: an `execute`
//! step followed by a `close`.
//!
//! Bound values travel as `{"type": ..., "value": ...}` objects. The same
//! [`Binds`] encoding keys expectations in [`crate::Fingerprint`], so a mock
//! matches a call exactly when the endpoint would receive identical binds.

use serde::{Deserialize, Serialize};

use crate::{params::bare_parameter_name, Error, Params, Result, Row, Value};

/// A bound value in its tagged wire form.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Arg<'a> {
    Null,
    Integer { value: String },
    Float { value: String },
    Text { value: &'a str },
    Blob { base64: &'a str },
}

impl<'a> From<&'a Value> for Arg<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Integer(value) => Self::Integer {
                value: value.to_string(),
            },
            // -0.0 == 0.0 in SQL, so both get the same text.
            Value::Float(value) => Self::Float {
                value: format!("{:?}", if *value == 0.0 { 0.0 } else { *value }),
            },
            Value::Text(value) => Self::Text {
                value: value.as_str(),
            },
            Value::BlobBase64(base64) => Self::Blob {
                base64: base64.as_str(),
            },
        }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct NamedArg<'a> {
    name: &'a str,
    value: Arg<'a>,
}

/// Every bind of one call, with named parameters stripped of their prefix.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "binds", rename_all = "snake_case")]
pub(crate) enum Binds<'a> {
    Positional(Vec<Arg<'a>>),
    Named(Vec<NamedArg<'a>>),
}

impl<'a> From<&'a Params> for Binds<'a> {
    fn from(params: &'a Params) -> Self {
        match params {
            Params::Positional(values) => Self::Positional(values.iter().map(Arg::from).collect()),
            Params::Named(values) => Self::Named(
                values
                    .iter()
                    .map(|(name, value)| NamedArg {
                        name: bare_parameter_name(name),
                        value: Arg::from(value),
                    })
                    .collect(),
            ),
        }
    }
}

/// Request body: run `sql` once, then close the stream.
#[derive(Debug, Serialize)]
pub(crate) struct ExecuteRequest<'a> {
    requests: [Step<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Step<'a> {
    Execute { stmt: Statement<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    sql: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<Arg<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    named_args: Vec<NamedArg<'a>>,
    want_rows: bool,
}

impl<'a> ExecuteRequest<'a> {
    /// Fails on binds the endpoint cannot represent: non-finite floats and
    /// empty parameter names.
    pub(crate) fn new(sql: &'a str, params: &'a Params, want_rows: bool) -> Result<Self> {
        ensure_bindable(params)?;
        let (args, named_args) = match Binds::from(params) {
            Binds::Positional(args) => (args, Vec::new()),
            Binds::Named(named_args) => (Vec::new(), named_args),
        };
        let stmt = Statement {
            sql,
            args,
            named_args,
            want_rows,
        };
        Ok(Self {
            requests: [Step::Execute { stmt }, Step::Close],
        })
    }
}

fn ensure_bindable(params: &Params) -> Result<()> {
    match params {
        Params::Positional(values) => values.iter().try_for_each(ensure_finite),
        Params::Named(values) => values.iter().try_for_each(|(name, value)| {
            if bare_parameter_name(name).is_empty() {
                return Err(Error::Decode(
                    "named parameter name cannot be empty".to_owned(),
                ));
            }
            ensure_finite(value)
        }),
    }
}

fn ensure_finite(value: &Value) -> Result<()> {
    match value {
        Value::Float(value) if !value.is_finite() => Err(Error::Decode(format!(
            "non-finite float value '{value}' cannot be bound"
        ))),
        _ => Ok(()),
    }
}

/// Response body for an [`ExecuteRequest`].
#[derive(Debug, Deserialize)]
pub(crate) struct ExecuteResponse {
    results: Vec<StepResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StepResult {
    Ok { response: StepResponse },
    Error { error: StepError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StepResponse {
    Execute { result: Outcome },
    Close,
}

#[derive(Debug, Deserialize)]
struct StepError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl StepResult {
    fn into_response(self, request_index: usize) -> Result<StepResponse> {
        match self {
            Self::Ok { response } => Ok(response),
            Self::Error { error } => Err(Error::Pipeline {
                request_index,
                message: error.message,
                code: error.code,
            }),
        }
    }
}

impl ExecuteResponse {
    /// What the statement produced, once both steps are known to have succeeded.
    pub(crate) fn into_outcome(self) -> Result<Outcome> {
        let [execute, close]: [StepResult; 2] =
            self.results.try_into().map_err(|results: Vec<StepResult>| {
                Error::Decode(format!(
                    "result count mismatch: expected 2, got {}",
                    results.len()
                ))
            })?;

        let outcome = match execute.into_response(0)? {
            StepResponse::Execute { result } => result,
            StepResponse::Close => return Err(out_of_order(0, "execute", "close")),
        };
        match close.into_response(1)? {
            StepResponse::Close => Ok(outcome),
            StepResponse::Execute { .. } => Err(out_of_order(1, "close", "execute")),
        }
    }
}

fn out_of_order(request_index: usize, expected: &str, got: &str) -> Error {
    Error::Decode(format!(
        "expected {expected} response at request {request_index}, got '{got}'"
    ))
}

/// Rows and insert id reported for an executed statement.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Outcome {
    #[serde(default)]
    cols: Vec<Column>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
    #[serde(default)]
    last_insert_rowid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Cell {
    Null,
    Integer { value: String },
    Float { value: String },
    Text { value: String },
    Blob { base64: String },
}

impl TryFrom<Cell> for Value {
    type Error = Error;

    fn try_from(cell: Cell) -> Result<Self> {
        match cell {
            Cell::Null => Ok(Value::Null),
            Cell::Integer { value } => value
                .parse()
                .map(Value::Integer)
                .map_err(|err| Error::Decode(format!("invalid integer value '{value}': {err}"))),
            Cell::Float { value } => match value.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Ok(Value::Float(parsed)),
                Ok(_) => Err(Error::Decode(format!(
                    "non-finite float value '{value}' is unsupported"
                ))),
                Err(err) => Err(Error::Decode(format!(
                    "invalid float value '{value}': {err}"
                ))),
            },
            Cell::Text { value } => Ok(Value::Text(value)),
            Cell::Blob { base64 } => Ok(Value::BlobBase64(base64)),
        }
    }
}

impl Outcome {
    /// Parses `last_insert_rowid`, which the endpoint sends as a string.
    pub(crate) fn last_insert_id(&self) -> Result<Option<i64>> {
        self.last_insert_rowid
            .as_deref()
            .map(|value| {
                value.parse().map_err(|err| {
                    Error::Decode(format!("invalid last_insert_rowid '{value}': {err}"))
                })
            })
            .transpose()
    }

    /// Pairs every returned row with the column names.
    pub(crate) fn into_rows(self) -> Result<Vec<Row>> {
        let names: Vec<String> = self.cols.into_iter().map(|col| col.name).collect();

        self.rows
            .into_iter()
            .enumerate()
            .map(|(index, cells)| {
                if cells.len() != names.len() {
                    return Err(Error::Decode(format!(
                        "row {index} has {} values for {} columns",
                        cells.len(),
                        names.len()
                    )));
                }
                names
                    .iter()
                    .zip(cells)
                    .map(|(name, cell)| Ok((name.as_str(), Value::try_from(cell)?)))
                    .collect::<Result<Row>>()
            })
            .collect()
    }
}
