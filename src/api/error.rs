use std::{io::Read, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::api::envelope::{self, wrapped};

/// An error response from the API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The API responded with the standard error envelope.
    ErrorResponse {
        /// The HTTP status on the overall response.
        status: http::StatusCode,
        /// The structured error body.
        error: RestError,
    },
    /// The response did not carry an error envelope, but the HTTP status was
    /// not a success.
    Other(http::StatusCode),
    /// A successful response carried a body that did not have the expected
    /// shape.
    InvalidResponse {
        /// The HTTP status on the overall response.
        status: http::StatusCode,
        /// Where and why decoding failed.
        #[source]
        source: Arc<serde_path_to_error::Error<serde_json::Error>>,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::ErrorResponse { status, error } => {
                write!(f, "{}: ", status.as_u16())?;
                if let Some(request_id) = &error.request_id {
                    write!(f, "[request_id={request_id}] ")?;
                }
                write!(f, "{}", error.formatted_message())?;
                if let Some(class) = &error.error_class {
                    write!(f, " : {class}")?;
                }
            }
            ApiError::Other(status) => {
                write!(f, "{status}")?;
            }
            ApiError::InvalidResponse { status, source } => {
                write!(f, "Invalid response ({status}) at {}", source.path())?;
            }
        }

        Ok(())
    }
}

impl ApiError {
    /// The HTTP status of the failed response.
    pub fn status(&self) -> http::StatusCode {
        match self {
            ApiError::ErrorResponse { status, .. }
            | ApiError::Other(status)
            | ApiError::InvalidResponse { status, .. } => *status,
        }
    }

    /// The structured error body, if the server sent one.
    pub fn rest_error(&self) -> Option<&RestError> {
        match self {
            ApiError::ErrorResponse { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == http::StatusCode::NOT_FOUND
    }

    /// Build the error for a non-success response, decoding the standard
    /// error envelope if the body carries one.
    pub fn from_error_parts(parts: &http::response::Parts, body: impl Read) -> Self {
        match envelope::decode::<RestError>(body) {
            Ok(error) => ApiError::ErrorResponse {
                status: parts.status,
                error,
            },
            Err(_) => ApiError::Other(parts.status),
        }
    }

    pub(crate) fn invalid(
        status: http::StatusCode,
        source: serde_path_to_error::Error<serde_json::Error>,
    ) -> Self {
        tracing::error!(%status, path = %source.path(), "Failed to parse API response: {source}");
        ApiError::InvalidResponse {
            status,
            source: Arc::new(source),
        }
    }
}

/// The platform's standard error envelope, `{"error": {...}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestError {
    /// The server-side class of the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<String>,
    /// The server component which failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// A stable, dotted error code, e.g. `gdc.security.unauthorized`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// The message, possibly containing `%s` placeholders.
    #[serde(default)]
    pub message: String,
    /// Values for the placeholders in `message`, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<serde_json::Value>,
    /// The request id, for support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// The error id, for support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_id: Option<String>,
    /// A server-side stack trace, usually empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

wrapped!(RestError => "error");

impl RestError {
    /// The message with each `%s` replaced by the next parameter. Surplus
    /// placeholders are left in place.
    pub fn formatted_message(&self) -> String {
        let mut params = self.parameters.iter();
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();

        while let Some(idx) = rest.find("%s") {
            out.push_str(&rest[..idx]);
            match params.next() {
                Some(serde_json::Value::String(s)) => out.push_str(s),
                Some(other) => out.push_str(&other.to_string()),
                None => out.push_str("%s"),
            }
            rest = &rest[idx + 2..];
        }

        out.push_str(rest);
        out
    }
}
