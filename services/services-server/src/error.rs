// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Error kinds surfaced by the services API

use dropshot::{ClientErrorStatusCode, HttpError};
use thiserror::Error;

/// Errors returned by the resource layer and its collaborators.
///
/// Every variant maps to exactly one HTTP status; see the `From` impl below.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UnsupportedOperation(String),

    #[error("{0}")]
    Authorization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn cluster_not_found(cluster: &str) -> Self {
        ServiceError::NotFound(format!("Cluster '{}' not found", cluster))
    }

    pub fn service_not_found(cluster: &str, service: &str) -> Self {
        ServiceError::NotFound(format!(
            "Service '{}' not found in cluster '{}'",
            service, cluster
        ))
    }

    pub fn role_not_found(service: &str, role: &str) -> Self {
        ServiceError::NotFound(format!(
            "Role '{}' not found in service '{}'",
            role, service
        ))
    }

    pub fn command_not_found(id: u64) -> Self {
        ServiceError::NotFound(format!("Command {} not found", id))
    }

    /// Value of the `error_code` field in the JSON error body.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            ServiceError::NotFound(_) => Some("NotFound"),
            ServiceError::Validation(_) => Some("ValidationError"),
            ServiceError::Conflict(_) => Some("Conflict"),
            ServiceError::UnsupportedOperation(_) => Some("UnsupportedOperation"),
            ServiceError::Authorization(_) => Some("Forbidden"),
            ServiceError::Internal(_) => Some("Internal"),
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(e: ServiceError) -> Self {
        let code = e.error_code().map(str::to_string);
        match e {
            ServiceError::NotFound(msg) => {
                HttpError::for_client_error(code, ClientErrorStatusCode::NOT_FOUND, msg)
            }
            ServiceError::Validation(msg) | ServiceError::UnsupportedOperation(msg) => {
                HttpError::for_client_error(code, ClientErrorStatusCode::BAD_REQUEST, msg)
            }
            ServiceError::Conflict(msg) => {
                HttpError::for_client_error(code, ClientErrorStatusCode::CONFLICT, msg)
            }
            ServiceError::Authorization(msg) => {
                HttpError::for_client_error(code, ClientErrorStatusCode::FORBIDDEN, msg)
            }
            ServiceError::Internal(msg) => HttpError::for_internal_error(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ServiceError::UnsupportedOperation("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::Authorization("x".into()), StatusCode::FORBIDDEN),
            (
                ServiceError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let code = err.error_code().map(str::to_string);
            let http: HttpError = err.into();
            assert_eq!(http.status_code.as_status(), status);
            assert_eq!(http.error_code, code);
        }
    }

    #[test]
    fn test_internal_error_code_matches_wire() {
        let err = ServiceError::Internal("disk on fire".into());
        assert_eq!(err.error_code(), Some("Internal"));

        let http: HttpError = err.into();
        assert_eq!(http.error_code.as_deref(), Some("Internal"));
        assert_eq!(http.status_code.as_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages_are_external() {
        let http: HttpError = ServiceError::service_not_found("c1", "nope").into();
        assert_eq!(
            http.external_message,
            "Service 'nope' not found in cluster 'c1'"
        );
    }
}
