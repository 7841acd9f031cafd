//! HTTP error types.
//!
//! Maps errors from the gate, the spreadsheet parser, the merge engine and
//! the DOCX/archive layer into HTTP responses. Every variant renders a small
//! HTML page carrying the human-readable reason.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use access_gate::GateError;
use mail_merge::{MailMergeError, MergeError};
use store::{DocxError, StoreError};

use crate::routes::pages;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Credentials rejected, or no valid session token.
    Unauthorized(String),
    /// Malformed request or unacceptable upload.
    BadRequest(String),
    /// Request body exceeds the configured limit.
    PayloadTooLarge(String),
    /// Uploads were well-formed but could not be processed.
    Unprocessable(String),
    /// Internal server error.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg)
            | Self::Unprocessable(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status(), self.message())
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.message(), "request failed");
        } else {
            tracing::debug!(status = %status, error = %self.message(), "request rejected");
        }
        (status, Html(pages::error_page(status, self.message()))).into_response()
    }
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

impl From<DocxError> for AppError {
    fn from(err: DocxError) -> Self {
        match err {
            DocxError::Zip(_)
            | DocxError::XmlParse(_)
            | DocxError::InvalidStructure(_)
            | DocxError::MissingPart(_)
            | DocxError::Utf8(_) => Self::Unprocessable(format!("Invalid template: {err}")),

            DocxError::UndefinedPlaceholder(_) | DocxError::MalformedPlaceholder(_) => {
                Self::Unprocessable(err.to_string())
            }

            DocxError::Io(_) | DocxError::DuplicateEntry(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MailMergeError> for AppError {
    fn from(err: MailMergeError) -> Self {
        match err {
            MailMergeError::UnsupportedFormat(_) => Self::BadRequest(err.to_string()),

            MailMergeError::SpreadsheetParse(_)
            | MailMergeError::DuplicateColumn(_)
            | MailMergeError::EmptyDataSource(_) => {
                Self::Unprocessable(format!("Invalid spreadsheet: {err}"))
            }

            MailMergeError::FileNotFound(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MergeError> for AppError {
    fn from(err: MergeError) -> Self {
        Self::Unprocessable(format!("Failed to render {err}"))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidName(_) => Self::BadRequest(err.to_string()),
            StoreError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_are_unauthorized() {
        let err = AppError::from(GateError::InvalidCredentials);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Invalid email or password.");
        assert_eq!(AppError::from(GateError::MissingToken).message(), "Please log in first.");
    }

    #[test]
    fn test_render_failure_names_row_and_field() {
        let err = AppError::from(MergeError {
            record_index: 3,
            message: DocxError::UndefinedPlaceholder("amount".into()).to_string(),
            field_name: Some("amount".into()),
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message(), "Failed to render record 3: Undefined placeholder: {{ amount }}");
    }

    #[test]
    fn test_upload_errors() {
        assert_eq!(
            AppError::from(MailMergeError::UnsupportedFormat("x.csv".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(DocxError::InvalidStructure("no document".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(StoreError::InvalidName("../x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(DocxError::DuplicateEntry("record_1.docx".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_is_html() {
        let response = AppError::BadRequest("Missing <template> upload".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers().get(axum::http::header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
    }
}
