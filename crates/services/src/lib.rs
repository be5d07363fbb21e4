#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod config;
pub mod demographics;
pub mod enrollment_service;
pub mod error;
pub mod http;
pub mod inspector_service;

pub use support_core::Clock;

pub use app_services::AppServices;
pub use config::SupportConfig;
pub use demographics::{DemographicsBootstrap, DemographicsService, DemographicsStatus};
pub use enrollment_service::{EnrollmentModel, EnrollmentService};
pub use error::{
    AppServicesError, ConfigError, DemographicsServiceError, EnrollmentServiceError, HttpError,
    InspectorServiceError, TokenError,
};
pub use http::{LmsClient, RetryPolicy};
pub use inspector_service::{InspectorResult, InspectorService};
