use thiserror::Error;

/// A raw JSON value does not conform to its field's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` got value of unexpected type: {observed}, should be: {expected}{}", detail_suffix(.detail))]
pub struct ValidationError {
    pub field: String,
    /// Runtime kind of the raw value (`string`, `number`, ..., or `missing`).
    pub observed: &'static str,
    pub expected: String,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({d})"),
        None => String::new(),
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, observed: &'static str, expected: impl ToString) -> Self {
        Self {
            field: field.into(),
            observed,
            expected: expected.to_string(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Re-root a nested record failure under its enclosing field.
    pub fn under(mut self, parent: &str) -> Self {
        self.field = format!("{parent}.{}", self.field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("no serializer registered for value kind `{kind}`")]
    Unregistered { kind: &'static str },
    #[error("date {date} has no YYYY-MM-DD form (year must be within 0..=9999)")]
    DateOutOfRange { date: chrono::NaiveDate },
}

/// A decoded value does not fit the Rust type it is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot construct `{expected}` from {found} value{}", field_suffix(.field))]
pub struct ConstructError {
    pub field: Option<String>,
    pub expected: String,
    pub found: &'static str,
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(f) => format!(" in field `{f}`"),
        None => String::new(),
    }
}

impl ConstructError {
    pub fn new(expected: impl ToString, found: &'static str) -> Self {
        Self { field: None, expected: expected.to_string(), found }
    }

    pub fn in_field(mut self, field: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigReason {
    WrongArity { found: usize },
    NotARecord,
}

/// A function's signature cannot be adapted to map-in/map-out form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot adapt function: parameter {param} of type `{declared}` {}", reason_text(.reason))]
pub struct ConfigError {
    pub param: String,
    pub declared: String,
    pub reason: ConfigReason,
}

fn reason_text(reason: &ConfigReason) -> String {
    match reason {
        ConfigReason::WrongArity { found } => {
            format!("is not the only one; expected exactly one record-typed parameter, found {found}")
        }
        ConfigReason::NotARecord => "is not a record type".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid JSON at {path}: {source}")]
    Json { path: String, source: serde_json::Error },
    #[error("expected a JSON object, got {observed}")]
    NotAnObject { observed: &'static str },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Construct(#[from] ConstructError),
    #[error("failed to write JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<serde_path_to_error::Error<serde_json::Error>> for Error {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        Error::Json { path, source: err.into_inner() }
    }
}

/// Failure of an adapted call. Validation failures mean bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Construct(#[from] ConstructError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}
