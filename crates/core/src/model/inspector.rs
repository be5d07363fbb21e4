use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InspectorQueryError {
    #[error("Search either by edx username or email, or Institution user key, but not both")]
    AmbiguousLearner,
    #[error("Enter an edX username or email, or an institution user key")]
    MissingLearner,
}

/// Single sign-on link between an LMS account and an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoRecord {
    pub uid: String,
}

/// The LMS account, or only the external key when no account is linked yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub external_user_key: Option<String>,
    /// `None` when the learner has no SSO records at all.
    #[serde(default)]
    pub sso_list: Option<Vec<SsoRecord>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdVerification {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub verification_expiry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEnrollment {
    pub course_id: String,
    pub is_active: bool,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCourseEnrollment {
    pub course_key: String,
    #[serde(default)]
    pub course_url: Option<String>,
    pub status: String,
    pub created: String,
    pub modified: String,
    #[serde(default)]
    pub course_enrollment: Option<CourseEnrollment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEnrollment {
    pub program_uuid: Uuid,
    #[serde(default)]
    pub program_name: Option<String>,
    pub status: String,
    pub created: String,
    pub modified: String,
    #[serde(default)]
    pub external_user_key: Option<String>,
    #[serde(default)]
    pub program_course_enrollments: Vec<ProgramCourseEnrollment>,
}

/// Everything the inspector found for one learner. Each section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerInfo {
    #[serde(default)]
    pub user: Option<UserAccount>,
    #[serde(default)]
    pub id_verification: Option<IdVerification>,
    #[serde(default)]
    pub enrollments: Option<Vec<ProgramEnrollment>>,
}

impl LearnerInfo {
    /// True when nothing was found, which hides the "Search Results" heading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.id_verification.is_none() && self.enrollments.is_none()
    }
}

/// Search form values. Blank strings count as "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorQuery {
    #[serde(default)]
    pub edx_user: String,
    #[serde(default)]
    pub org_key: String,
    #[serde(default)]
    pub external_user_key: String,
}

impl InspectorQuery {
    #[must_use]
    pub fn by_edx_user(edx_user: impl Into<String>) -> Self {
        Self {
            edx_user: edx_user.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_external_key(org_key: impl Into<String>, external_user_key: impl Into<String>) -> Self {
        Self {
            edx_user: String::new(),
            org_key: org_key.into(),
            external_user_key: external_user_key.into(),
        }
    }

    /// Both identifiers filled in: the form shows its alert and disables search.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        !self.edx_user.trim().is_empty() && !self.external_user_key.trim().is_empty()
    }

    /// # Errors
    ///
    /// Returns `InspectorQueryError` when neither or both learner identifiers are set.
    pub fn validate(&self) -> Result<(), InspectorQueryError> {
        if self.is_ambiguous() {
            return Err(InspectorQueryError::AmbiguousLearner);
        }
        if self.edx_user.trim().is_empty() && self.external_user_key.trim().is_empty() {
            return Err(InspectorQueryError::MissingLearner);
        }
        Ok(())
    }

    /// Query-string pairs, skipping blank values.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("edx_user", &self.edx_user),
            ("org_key", &self.org_key),
            ("external_user_key", &self.external_user_key),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (key, value.trim().to_string()))
        .collect()
    }
}
