use dioxus::prelude::*;
use services::{
    DemographicsServiceError, EnrollmentServiceError, HttpError, InspectorServiceError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    NotFound,
    SignedOut,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            ViewError::NotFound => "We couldn't find what you were looking for.",
            ViewError::SignedOut => "Your session has ended. Please sign in again.",
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }
}

impl From<&HttpError> for ViewError {
    fn from(err: &HttpError) -> Self {
        match err {
            HttpError::NotFound => ViewError::NotFound,
            HttpError::Unauthorized => ViewError::SignedOut,
            _ => ViewError::Unknown,
        }
    }
}

impl From<DemographicsServiceError> for ViewError {
    fn from(err: DemographicsServiceError) -> Self {
        match &err {
            DemographicsServiceError::Http(http) => http.into(),
            _ => ViewError::Unknown,
        }
    }
}

impl From<EnrollmentServiceError> for ViewError {
    fn from(err: EnrollmentServiceError) -> Self {
        match &err {
            EnrollmentServiceError::Http(http) => http.into(),
            _ => ViewError::Unknown,
        }
    }
}

impl From<InspectorServiceError> for ViewError {
    fn from(err: InspectorServiceError) -> Self {
        match &err {
            InspectorServiceError::Http(http) => http.into(),
            _ => ViewError::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: &Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(*err),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
