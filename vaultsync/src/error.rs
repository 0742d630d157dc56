//! Error types and result definitions for sync operations.
//!
//! Provides a classified error system with captured diagnostic metadata for
//! the replication pipeline. Callers branch on [`ErrorKind`] rather than on
//! error message contents; in particular, duplicate-key detection during the
//! row-by-row load fallback relies on [`ErrorKind::ConstraintViolation`]
//! derived from the store's structured error code, never on substring
//! matching.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use sqlx::error::ErrorKind as SqlxErrorKind;

/// Convenient result type for sync operations using [`SyncError`] as the error type.
pub type SyncResult<T> = Result<T, SyncError>;

/// Detailed payload stored for a [`SyncError`].
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for sync operations.
///
/// Carries a [`ErrorKind`] classification, a static description, optional
/// dynamic detail, the originating error, and captured callsite metadata.
#[derive(Debug, Clone)]
pub struct SyncError {
    payload: ErrorPayload,
}

/// Specific categories of errors that can occur during sync operations.
///
/// The pipeline's failure policy is driven by these kinds: duplicate rows
/// surface as [`ErrorKind::ConstraintViolation`] and are skipped by the load
/// fallback, while every other kind is handled according to the stage it
/// occurred in.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection errors
    ConnectionFailed,
    AuthenticationFailed,

    // Query & execution errors
    QueryFailed,
    QueryCanceled,

    // Data errors
    ConstraintViolation,
    SchemaError,
    InvalidData,
    ConversionError,

    // IO & serialization errors
    IoError,
    SerializationError,
    DeserializationError,

    // Configuration errors
    ConfigError,

    // Unknown / uncategorized
    Unknown,
}

impl SyncError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        self.payload.backtrace.as_ref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`SyncError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SyncError {
            payload: ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            },
        }
    }
}

impl PartialEq for SyncError {
    fn eq(&self, other: &SyncError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let location = self.payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.payload.kind,
            self.payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        if let Some(detail) = self.payload.detail.as_deref() {
            write!(f, " ({detail})")?;
        }

        Ok(())
    }
}

impl error::Error for SyncError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Creates a [`SyncError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SyncError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SyncError {
        SyncError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`SyncError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SyncError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SyncError {
        SyncError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`SyncError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SyncError {
    #[track_caller]
    fn from(err: std::io::Error) -> SyncError {
        let detail = err.to_string();
        let source = Arc::new(err);
        SyncError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`serde_json::Error`] to [`SyncError`] with the appropriate error kind.
impl From<serde_json::Error> for SyncError {
    #[track_caller]
    fn from(err: serde_json::Error) -> SyncError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            _ => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        let source = Arc::new(err);
        SyncError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// SQLSTATE class prefixes used to classify database errors that sqlx does not
/// already categorize through [`sqlx::error::ErrorKind`].
const SQLSTATE_CLASS_CONNECTION: &str = "08";
const SQLSTATE_CLASS_AUTHORIZATION: &str = "28";
const SQLSTATE_CLASS_DATA: &str = "22";
const SQLSTATE_CLASS_INSUFFICIENT_RESOURCES: &str = "53";
const SQLSTATE_CLASS_OPERATOR_INTERVENTION: &str = "57";

/// SQLSTATE codes signalling that a relation, column, or schema is missing.
///
/// These are the schema-drift signatures: the warehouse table's column set no
/// longer matches the shaped row layout, or the table itself is gone.
const SQLSTATE_UNDEFINED_TABLE: &str = "42P01";
const SQLSTATE_UNDEFINED_COLUMN: &str = "42703";
const SQLSTATE_INVALID_SCHEMA_NAME: &str = "3F000";

/// Converts [`sqlx::Error`] to [`SyncError`] with the appropriate error kind.
///
/// Uniqueness violations are mapped structurally to
/// [`ErrorKind::ConstraintViolation`] via the driver's error classification,
/// and missing relations or columns to [`ErrorKind::SchemaError`] via their
/// SQLSTATE codes.
impl From<sqlx::Error> for SyncError {
    #[track_caller]
    fn from(err: sqlx::Error) -> SyncError {
        let (kind, description) = match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                SqlxErrorKind::UniqueViolation => {
                    (ErrorKind::ConstraintViolation, "Unique constraint violated")
                }
                SqlxErrorKind::ForeignKeyViolation
                | SqlxErrorKind::NotNullViolation
                | SqlxErrorKind::CheckViolation => {
                    (ErrorKind::InvalidData, "Constraint violation")
                }
                _ => match db_err.code().as_deref() {
                    Some(
                        SQLSTATE_UNDEFINED_TABLE
                        | SQLSTATE_UNDEFINED_COLUMN
                        | SQLSTATE_INVALID_SCHEMA_NAME,
                    ) => (
                        ErrorKind::SchemaError,
                        "Relation, column, or schema not found",
                    ),
                    Some(code) if code.starts_with(SQLSTATE_CLASS_CONNECTION) => {
                        (ErrorKind::ConnectionFailed, "Database connection failed")
                    }
                    Some(code) if code.starts_with(SQLSTATE_CLASS_AUTHORIZATION) => {
                        (ErrorKind::AuthenticationFailed, "Authentication failed")
                    }
                    Some(code) if code.starts_with(SQLSTATE_CLASS_DATA) => {
                        (ErrorKind::ConversionError, "Data conversion failed")
                    }
                    Some(code) if code.starts_with(SQLSTATE_CLASS_INSUFFICIENT_RESOURCES) => {
                        (ErrorKind::ConnectionFailed, "Database resource limitation")
                    }
                    Some(code) if code.starts_with(SQLSTATE_CLASS_OPERATOR_INTERVENTION) => {
                        (ErrorKind::QueryCanceled, "Query canceled")
                    }
                    _ => (ErrorKind::QueryFailed, "Database query failed"),
                },
            },
            sqlx::Error::Io(_) => (ErrorKind::IoError, "Database I/O failed"),
            sqlx::Error::Tls(_) => (ErrorKind::ConnectionFailed, "TLS negotiation failed"),
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
                (ErrorKind::ConnectionFailed, "Connection pool unavailable")
            }
            sqlx::Error::Configuration(_) => {
                (ErrorKind::ConfigError, "Database configuration invalid")
            }
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. } => {
                (ErrorKind::SchemaError, "Result column not found")
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::TypeNotFound { .. } => {
                (ErrorKind::ConversionError, "Row decoding failed")
            }
            _ => (ErrorKind::QueryFailed, "Database operation failed"),
        };

        let detail = err.to_string();
        let source = Arc::new(err);
        SyncError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}

/// Converts [`chrono::ParseError`] to [`SyncError`] with [`ErrorKind::ConversionError`].
impl From<chrono::ParseError> for SyncError {
    #[track_caller]
    fn from(err: chrono::ParseError) -> SyncError {
        let detail = err.to_string();
        let source = Arc::new(err);
        SyncError::from_components(
            ErrorKind::ConversionError,
            Cow::Borrowed("Datetime parsing failed"),
            Some(Cow::Owned(detail)),
            Some(source),
        )
    }
}
