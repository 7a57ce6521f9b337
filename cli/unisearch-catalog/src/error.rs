//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The request never produced a response.
    #[error("couldn't reach the catalog")]
    Network(#[source] reqwest::Error),
    /// A response was received with an unsuccessful status.
    #[error("{}", fmt_http_error(.status, .detail.as_deref()))]
    Http {
        status: StatusCode,
        detail: Option<String>,
    },
    /// The catalog rejected semantically invalid input.
    #[error("{message}")]
    Validation { message: String },
    #[error("couldn't parse catalog response")]
    InvalidResponse(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

impl CatalogClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Shorthand for an unsuccessful response without details.
    pub fn http(status: StatusCode) -> Self {
        CatalogClientError::Http {
            status,
            detail: None,
        }
    }
}

/// Body of unsuccessful responses, `{"detail": ...}`.
///
/// `detail` is usually a string but may be any JSON value,
/// e.g. a list of validation problems.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    detail: serde_json::Value,
}

impl ErrorResponse {
    pub(crate) fn into_message(self) -> String {
        match self.detail {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        }
    }
}

/// Consume an unsuccessful response into a [CatalogClientError::Http].
///
/// Bodies that don't carry a `detail` are dropped,
/// they may contain HTML garbage.
pub(crate) async fn http_error(response: reqwest::Response) -> CatalogClientError {
    let status = response.status();
    let detail = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(ErrorResponse::into_message);
    CatalogClientError::Http { status, detail }
}

fn fmt_http_error(status: &StatusCode, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{status}: {detail}"),
        None => format!("{status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_detail() {
        let err = CatalogClientError::Http {
            status: StatusCode::NOT_FOUND,
            detail: Some("University not found".to_string()),
        };
        assert_eq!(err.to_string(), "404 Not Found: University not found");
        assert_eq!(
            CatalogClientError::http(StatusCode::INTERNAL_SERVER_ERROR).to_string(),
            "500 Internal Server Error"
        );
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let response: ErrorResponse =
            serde_json::from_str(r#"{"detail": [{"msg": "field required"}]}"#).unwrap();
        assert_eq!(response.into_message(), r#"[{"msg":"field required"}]"#);
    }
}
