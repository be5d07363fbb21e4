//! Shared error types for the services crate.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use support_core::auth::JwtError;
use support_core::model::{DemographicsError, EnrollmentError, InspectorQueryError};

/// Errors emitted while reading `SupportConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid LMS base url {raw:?}: {source}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} must be a non-negative integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors emitted by the CSRF and JWT token helpers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    #[error("token request failed with status {0}")]
    HttpStatus(StatusCode),
    #[error("token endpoint returned no csrf token")]
    MissingCsrfToken,
    #[error("refresh succeeded but the jwt cookie was not set")]
    MissingJwtCookie,
    #[error("target url has no host: {0}")]
    NoHost(String),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// A failure from a fetch other callers were waiting on too.
    #[error(transparent)]
    Shared(Arc<TokenError>),
}

/// Errors emitted by `LmsClient` and the gateways built on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpError {
    #[error("resource not found")]
    NotFound,
    #[error("not authenticated")]
    Unauthorized,
    #[error("request failed with status {0}")]
    Status(StatusCode),
    #[error("invalid request path: {0}")]
    InvalidPath(#[from] url::ParseError),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl HttpError {
    /// Maps a non-success status the way every gateway reports it.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            other => Self::Status(other),
        }
    }
}

/// Errors emitted by `DemographicsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DemographicsServiceError {
    #[error(transparent)]
    Demographics(#[from] DemographicsError),
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Errors emitted by `EnrollmentModel` and `EnrollmentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnrollmentServiceError {
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Errors emitted by `InspectorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InspectorServiceError {
    #[error(transparent)]
    Query(#[from] InspectorQueryError),
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}
