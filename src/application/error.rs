use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tagfeed_api_types::ErrorResponse;
use thiserror::Error;

use crate::{
    application::upstream::UpstreamError, domain::query::QueryError, infra::error::InfraError,
};

/// Diagnostic detail attached to failed responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("resource not found")]
    NotFound,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Query(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Infra(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed in the JSON body. Validation messages are part of the
    /// public contract; everything else hides its detail behind a fixed string.
    fn presentation_message(&self) -> String {
        match self {
            AppError::Query(err) => err.to_string(),
            AppError::Upstream(_) => "upstream unavailable".to_string(),
            AppError::NotFound => "not found".to_string(),
            AppError::Infra(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.presentation_message(),
        };
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests_with_contract_message() {
        let err = AppError::from(QueryError::InvalidDirection);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.presentation_message(), "direction parameter is invalid");
    }

    #[test]
    fn upstream_errors_hide_detail_behind_bad_gateway() {
        let err = AppError::from(UpstreamError::status("tech", 503));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.presentation_message(), "upstream unavailable");
    }

    #[test]
    fn response_carries_error_report() {
        let response = AppError::from(UpstreamError::timeout("tech")).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.status, StatusCode::BAD_GATEWAY);
        assert_eq!(report.messages[0], "upstream request for tag `tech` timed out");
    }
}
