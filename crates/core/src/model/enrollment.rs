use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("a new mode is required")]
    MissingMode,
    #[error("a reason is required for manual enrollment changes")]
    MissingReason,
    #[error("a course id is required")]
    MissingCourse,
    #[error("another change to this enrollment is still being saved")]
    ChangeInProgress,
}

/// Audit trail attached when support staff change a learner's track.
///
/// The API sends `{}` for enrollments that were never changed manually, which
/// deserializes to the default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEnrollment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ManualEnrollment {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enrolled_by.is_none() && self.reason.is_none()
    }
}

/// A track the course offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMode {
    pub slug: String,
    pub name: String,
}

/// One course enrollment as the support endpoint reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub course_id: String,
    pub mode: String,
    #[serde(default)]
    pub manual_enrollment: ManualEnrollment,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub course_modes: Vec<CourseMode>,
}

fn default_active() -> bool {
    true
}

impl EnrollmentRecord {
    #[must_use]
    pub fn new(course_id: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            mode: mode.into(),
            manual_enrollment: ManualEnrollment::default(),
            is_active: true,
            course_modes: Vec::new(),
        }
    }

    /// Validate a mode change, snapshot the current state and apply the new mode
    /// locally.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError` when the new mode or the reason is blank.
    pub fn begin_change(
        &mut self,
        new_mode: &str,
        reason: &str,
    ) -> Result<(EnrollmentChange, EnrollmentSnapshot), EnrollmentError> {
        let change = EnrollmentChange::new(&self.course_id, &self.mode, new_mode, reason)?;
        let snapshot = EnrollmentSnapshot {
            mode: self.mode.clone(),
            manual_enrollment: self.manual_enrollment.clone(),
        };
        self.mode = change.new_mode.clone();
        Ok((change, snapshot))
    }

    /// Overwrite local state with the server's confirmation.
    pub fn commit(&mut self, confirmed: EnrollmentConfirmation) {
        self.mode = confirmed.mode;
        self.manual_enrollment = confirmed.manual_enrollment;
    }

    /// Restore the values captured by [`EnrollmentRecord::begin_change`].
    pub fn rollback(&mut self, snapshot: EnrollmentSnapshot) {
        self.mode = snapshot.mode;
        self.manual_enrollment = snapshot.manual_enrollment;
    }
}

/// Values saved before a change request so a failure can restore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentSnapshot {
    mode: String,
    manual_enrollment: ManualEnrollment,
}

/// PATCH body for `/support/enrollment/{username}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentChange {
    pub course_id: String,
    pub old_mode: String,
    pub new_mode: String,
    pub reason: String,
}

impl EnrollmentChange {
    /// # Errors
    ///
    /// Returns `EnrollmentError` when the new mode or the reason is blank.
    pub fn new(
        course_id: &str,
        old_mode: &str,
        new_mode: &str,
        reason: &str,
    ) -> Result<Self, EnrollmentError> {
        let new_mode = new_mode.trim();
        if new_mode.is_empty() {
            return Err(EnrollmentError::MissingMode);
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EnrollmentError::MissingReason);
        }
        Ok(Self {
            course_id: course_id.to_string(),
            old_mode: old_mode.to_string(),
            new_mode: new_mode.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// POST body for `/support/enrollment/{username}`: enroll the learner in a
/// course they are not enrolled in yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEnrollment {
    pub course_id: String,
    pub mode: String,
    pub reason: String,
}

impl NewEnrollment {
    /// # Errors
    ///
    /// Returns `EnrollmentError` when the course, the mode or the reason is blank.
    pub fn new(course_id: &str, mode: &str, reason: &str) -> Result<Self, EnrollmentError> {
        let course_id = course_id.trim();
        if course_id.is_empty() {
            return Err(EnrollmentError::MissingCourse);
        }
        let mode = mode.trim();
        if mode.is_empty() {
            return Err(EnrollmentError::MissingMode);
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(EnrollmentError::MissingReason);
        }
        Ok(Self {
            course_id: course_id.to_string(),
            mode: mode.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// The audit row the server writes for a new manual enrollment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentCreated {
    #[serde(default)]
    pub enrolled_by: Option<String>,
    #[serde(default)]
    pub enrolled_email: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Successful response to an enrollment change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentConfirmation {
    pub mode: String,
    #[serde(default)]
    pub manual_enrollment: ManualEnrollment,
}
