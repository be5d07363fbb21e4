use thiserror::Error;

use crate::auth::JwtError;
use crate::model::{DemographicsError, EnrollmentError, InspectorQueryError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Demographics(#[from] DemographicsError),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    InspectorQuery(#[from] InspectorQueryError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
}
