use std::{fmt, io};

use crate::error::service::ErrorInfo;
use crate::executor::ImportReport;

/// Crate-wide `Result` type using [`PorterError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, PorterError>;

/// Top-level error type for export and import runs.
#[derive(Debug)]
pub enum PorterError {
    /// Credentials or endpoint rejected by the search service.
    Auth(AuthError),

    /// Filter, select or order-by expression rejected by the service.
    Query(QueryError),

    /// Input file is not a JSON array of objects.
    Format(FormatError),

    /// File system errors.
    Io(io::Error),

    /// Error response returned by the search service.
    Service(ServiceError),

    /// Transport failure talking to the service (DNS, TLS, timeout).
    Http(reqwest::Error),

    /// Configuration errors.
    Config(ConfigError),

    /// Run interrupted by the user.
    Cancelled,

    /// Import stopped by a fatal error after some batches were sent.
    ///
    /// Carries what was imported up to that point.
    ImportAborted {
        report: Box<ImportReport>,
        cause: Box<PorterError>,
    },

    /// Generic error with a free-form message.
    Generic(String),
}

/// Authentication-specific errors.
#[derive(Debug)]
pub enum AuthError {
    /// The service answered 401 or 403.
    Rejected { status: u16, message: String },

    /// No API key was supplied by flag, environment or config.
    MissingKey,
}

/// Query rejected by the service.
#[derive(Debug)]
pub struct QueryError {
    /// Service error code, if any (e.g. `InvalidRequestParameter`).
    pub code: Option<String>,

    /// Human-readable message from the service.
    pub message: String,
}

/// Malformed input file.
#[derive(Debug)]
pub enum FormatError {
    /// The file is not valid JSON.
    InvalidJson { path: String, message: String },

    /// The top-level JSON value is not an array.
    NotAnArray { path: String, found: &'static str },

    /// An element of the array is not an object.
    NotAnObject {
        path: String,
        index: usize,
        found: &'static str,
    },
}

/// Error response from the search service.
#[derive(Debug)]
pub struct ServiceError {
    /// HTTP status code of the response.
    pub status: u16,

    /// Structured error information parsed from the body.
    pub info: ErrorInfo,

    /// Whether remaining work must be abandoned.
    pub fatal: bool,
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl PorterError {
    /// Whether this error must abort the remaining batches of an import.
    ///
    /// Only non-fatal service responses (a rejected batch, throttling) and
    /// request timeouts let the importer carry on with the next batch.
    pub fn is_fatal(&self) -> bool {
        match self {
            PorterError::Service(e) => e.fatal,
            PorterError::Http(e) => !e.is_timeout(),
            _ => true,
        }
    }

    /// The underlying error, looking through [`PorterError::ImportAborted`].
    pub fn cause(&self) -> &PorterError {
        match self {
            PorterError::ImportAborted { cause, .. } => cause.cause(),
            other => other,
        }
    }
}

impl ServiceError {
    /// Best available message for reporting.
    pub fn message(&self) -> String {
        self.info
            .full_message()
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for PorterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PorterError::Auth(e) => write!(f, "Authentication error: {e}"),
            PorterError::Query(e) => write!(f, "Query error: {e}"),
            PorterError::Format(e) => write!(f, "Format error: {e}"),
            PorterError::Io(e) => write!(f, "I/O error: {e}"),
            PorterError::Service(e) => write!(f, "Service error: {e}"),
            PorterError::Http(e) => write!(f, "Request failed: {e}"),
            PorterError::Config(e) => write!(f, "Configuration error: {e}"),
            PorterError::Cancelled => write!(f, "Operation cancelled"),
            PorterError::ImportAborted { cause, .. } => write!(f, "{cause}"),
            PorterError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Rejected { status, message } => {
                write!(f, "credentials rejected (HTTP {status}): {message}")
            }
            AuthError::MissingKey => write!(
                f,
                "no API key given (use --key, SEARCH_PORTER_API_KEY or connection.api_key)"
            ),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::InvalidJson { path, message } => {
                write!(f, "{path} is not valid JSON: {message}")
            }
            FormatError::NotAnArray { path, found } => {
                write!(f, "{path} must contain a JSON array, found {found}")
            }
            FormatError::NotAnObject { path, index, found } => {
                write!(
                    f,
                    "{path}: element {index} must be a JSON object, found {found}"
                )
            }
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(code) = &self.info.code {
            write!(f, " {code}")?;
        }
        if let Some(message) = &self.info.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for PorterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PorterError::Io(e) => Some(e),
            PorterError::Http(e) => Some(e),
            PorterError::ImportAborted { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}
impl std::error::Error for AuthError {}
impl std::error::Error for QueryError {}
impl std::error::Error for FormatError {}
impl std::error::Error for ServiceError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to PorterError ========================= */

impl From<io::Error> for PorterError {
    fn from(err: io::Error) -> Self {
        PorterError::Io(err)
    }
}

impl From<reqwest::Error> for PorterError {
    fn from(err: reqwest::Error) -> Self {
        PorterError::Http(err)
    }
}

impl From<AuthError> for PorterError {
    fn from(err: AuthError) -> Self {
        PorterError::Auth(err)
    }
}

impl From<QueryError> for PorterError {
    fn from(err: QueryError) -> Self {
        PorterError::Query(err)
    }
}

impl From<FormatError> for PorterError {
    fn from(err: FormatError) -> Self {
        PorterError::Format(err)
    }
}

impl From<ServiceError> for PorterError {
    fn from(err: ServiceError) -> Self {
        PorterError::Service(err)
    }
}

impl From<ConfigError> for PorterError {
    fn from(err: ConfigError) -> Self {
        PorterError::Config(err)
    }
}

impl From<String> for PorterError {
    fn from(msg: String) -> Self {
        PorterError::Generic(msg)
    }
}

impl From<&str> for PorterError {
    fn from(msg: &str) -> Self {
        PorterError::Generic(msg.to_owned())
    }
}
