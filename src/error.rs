use std::{fmt, sync::Arc, time};

use crate::api::ApiError;

/// A connection-level failure reported by a [Transport](crate::Transport).
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// The error type returned by services and by [FutureResult](crate::FutureResult).
///
/// Errors are cheap to clone, so a resolved future can hand out its cached
/// failure as often as it is asked.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The request never produced a response.
    #[error("HTTP transport failed")]
    Transport(#[source] Arc<dyn std::error::Error + Send + Sync>),
    /// The platform answered with an error status not mapped to anything
    /// more specific.
    #[error(transparent)]
    Api(ApiError),
    /// A successful response did not have the expected shape.
    #[error("Unexpected response ({status})")]
    UnexpectedResponse {
        /// The HTTP status of the response.
        status: http::StatusCode,
        /// The original decoding failure.
        #[source]
        source: ApiError,
    },
    /// The requested resource does not exist.
    #[error("{kind} not found: {uri}")]
    NotFound {
        /// What kind of resource was requested.
        kind: ResourceKind,
        /// The URI (or id) that was requested.
        uri: String,
        /// The 404 response.
        #[source]
        source: ApiError,
    },
    /// An object built locally was passed where one loaded from the server
    /// (and so carrying its URI) is needed.
    #[error("{kind} has no URI")]
    MissingUri {
        /// What kind of object it was.
        kind: ResourceKind,
    },
    /// A submitted or polled operation failed.
    #[error("{message}")]
    Operation {
        /// The operation that failed.
        operation: Operation,
        /// A human-readable description of the failure.
        message: String,
        /// The HTTP status that ended the operation, if it ended on one.
        status: Option<http::StatusCode>,
        /// The error response, if any.
        #[source]
        source: Option<ApiError>,
    },
    /// The client stopped waiting for an asynchronous operation. The
    /// server-side job is not cancelled.
    #[error("Gave up waiting for {uri} after {waited:?}")]
    Timeout {
        /// The URI being polled.
        uri: String,
        /// How long the client waited.
        waited: time::Duration,
    },
    /// Writing a result to the caller's sink failed.
    #[error("Failed to write result")]
    Io(#[source] Arc<std::io::Error>),
    /// A URI handed to the client (or by the server) could not be used.
    #[error("Invalid URI")]
    InvalidUri(#[source] Arc<http::Error>),
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::InvalidResponse { status, .. } => Error::UnexpectedResponse { status, source: e },
            e => Error::Api(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}

impl From<http::Error> for Error {
    fn from(e: http::Error) -> Self {
        Error::InvalidUri(Arc::new(e))
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(Arc::from(e))
    }
}

impl Error {
    /// Turn a 404 into [Error::NotFound] for the given resource; any other
    /// error is returned unchanged.
    pub fn or_not_found(self, kind: ResourceKind, uri: impl Into<String>) -> Self {
        match self {
            Error::Api(source) if source.is_not_found() => Error::NotFound {
                kind,
                uri: uri.into(),
                source,
            },
            e => e,
        }
    }

    /// The HTTP status this error ended on, if any.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Error::Api(e) | Error::NotFound { source: e, .. } => Some(e.status()),
            Error::UnexpectedResponse { status, .. } => Some(*status),
            Error::Operation { status, .. } => *status,
            _ => None,
        }
    }
}

macro_rules! kinds {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $display:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        $vis enum $name {
            $(
                #[doc = $display]
                $variant,
            )*
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $($name::$variant => $display,)*
                })
            }
        }
    };
}

kinds! {
    /// The kinds of resources that can be reported missing.
    pub enum ResourceKind {
        Account => "Account",
        Project => "Project",
        Process => "Process",
        ProcessExecution => "Process execution",
        Integration => "Connector integration",
        Dataset => "Dataset",
        OutputStage => "Output stage",
        ConfigItem => "Config item",
        ProjectTemplate => "Project template",
    }
}

kinds! {
    /// The operations whose failures are reported through [Error::Operation].
    pub enum Operation {
        CreateAccount => "create account",
        UpdateAccount => "update account",
        CreateProject => "create project",
        ModelDiff => "project model diff",
        ModelUpdate => "project model update",
        ReportExport => "report export",
        RawExport => "raw report export",
        ReportExecution => "report execution",
        AfmExecution => "AFM execution",
        DatasetLoad => "dataset load",
        ProcessExecution => "process execution",
        ConnectorProcess => "connector process",
        UpdateOutputStage => "output stage update",
        Notification => "project notification",
        SetConfigItem => "config item update",
    }
}

/// Maps HTTP statuses that end one operation to human-readable failure
/// messages. Every table has a fallback for statuses it does not list.
#[derive(Debug, Clone, Copy)]
pub struct FailureTable {
    operation: Operation,
    entries: &'static [(u16, &'static str)],
    fallback: &'static str,
}

impl FailureTable {
    /// Build a table for `operation`.
    pub const fn new(
        operation: Operation,
        entries: &'static [(u16, &'static str)],
        fallback: &'static str,
    ) -> Self {
        Self {
            operation,
            entries,
            fallback,
        }
    }

    /// The operation the table describes.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The message listed for `status`, if there is one.
    pub fn lookup(&self, status: http::StatusCode) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(code, _)| *code == status.as_u16())
            .map(|(_, message)| *message)
    }

    /// The message for `status`, or the fallback.
    pub fn message(&self, status: http::StatusCode) -> &'static str {
        self.lookup(status).unwrap_or(self.fallback)
    }

    /// The fallback message.
    pub fn fallback(&self) -> &'static str {
        self.fallback
    }

    /// The error for a failed response.
    pub fn error(&self, source: ApiError) -> Error {
        let status = source.status();
        Error::Operation {
            operation: self.operation,
            message: self.message(status).to_owned(),
            status: Some(status),
            source: Some(source),
        }
    }

    /// Map an error status returned by the platform through the table. Other
    /// errors pass through unchanged.
    pub fn wrap(&self, error: Error) -> Error {
        match error {
            Error::Api(source) => self.error(source),
            e => e,
        }
    }

    /// The error for a response that carried no usable error body.
    pub fn error_for_status(&self, status: http::StatusCode) -> Error {
        self.error(ApiError::Other(status))
    }

    /// The error for an operation the server reported as failed in an
    /// otherwise successful response.
    pub fn failed(&self, detail: &str) -> Error {
        let message = if detail.is_empty() {
            self.fallback.to_owned()
        } else {
            format!("{}: {detail}", self.fallback)
        };

        Error::Operation {
            operation: self.operation,
            message,
            status: None,
            source: None,
        }
    }
}
