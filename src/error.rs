use std::fmt;

use thiserror::Error;

/// Failure reported by the HTTP collaborator.
///
/// Business-rule rejections from the server (insufficient stock, duplicate
/// names) arrive as [`ApiError::Status`] and are handled like any other
/// network failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("request failed with status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// Builds a status failure carrying the server-provided message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: Some(message.into()),
        }
    }

    /// Message shown to the user: the server's own message when it sent one,
    /// otherwise the per-operation default.
    pub fn user_message(&self, default: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => default.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),
    #[error("store contents are not valid: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("login rejected: {0}")]
    Login(#[from] ApiError),
    #[error("session could not be persisted: {0}")]
    Store(#[from] StoreError),
}

/// Errors from talking to the query coordinator actor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryError {
    #[error("invalid page size: {0}")]
    InvalidPageSize(u32),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

/// A single field-level rule violation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,
    #[error("Minimum {0} characters")]
    MinLength(usize),
    #[error("Maximum {0} characters")]
    MaxLength(usize),
    #[error("The minimum value is {0}")]
    Min(f64),
    #[error("The maximum value is {0}")]
    Max(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: ValidationError,
}

/// Every violation found in one form submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, error: ValidationError) {
        self.errors.push(FieldError { field, error });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// First violation recorded for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.error)
    }

    pub(crate) fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.error))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Error surfaced by the list screen and forms.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Failures while starting or stopping the application.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AppError {
    #[error("could not open session store: {0}")]
    Store(#[from] StoreError),
    #[error("could not build api client: {0}")]
    Api(#[from] ApiError),
    #[error("actor task failed: {0}")]
    Task(String),
}
