use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{info, warn};

use support_core::model::{
    CourseMode, EnrollmentChange, EnrollmentConfirmation, EnrollmentCreated, EnrollmentError,
    EnrollmentRecord, EnrollmentSnapshot, ManualEnrollment, NewEnrollment,
};

use crate::error::{EnrollmentServiceError, HttpError};
use crate::http::LmsClient;

fn enrollment_path(username: &str) -> String {
    format!("/support/enrollment/{username}")
}

/// The support enrollment endpoint.
#[async_trait]
pub trait EnrollmentGateway: Send + Sync {
    async fn list_enrollments(&self, username: &str) -> Result<Vec<EnrollmentRecord>, HttpError>;
    async fn change_enrollment(
        &self,
        username: &str,
        change: &EnrollmentChange,
    ) -> Result<EnrollmentConfirmation, HttpError>;
    /// The server answers 400 for an unknown mode or an existing enrollment.
    async fn create_enrollment(
        &self,
        username: &str,
        enrollment: &NewEnrollment,
    ) -> Result<EnrollmentCreated, HttpError>;
}

#[derive(Clone)]
pub struct HttpEnrollmentGateway {
    client: LmsClient,
}

impl HttpEnrollmentGateway {
    #[must_use]
    pub fn new(client: LmsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnrollmentGateway for HttpEnrollmentGateway {
    async fn list_enrollments(&self, username: &str) -> Result<Vec<EnrollmentRecord>, HttpError> {
        self.client.get_json(&enrollment_path(username)).await
    }

    async fn change_enrollment(
        &self,
        username: &str,
        change: &EnrollmentChange,
    ) -> Result<EnrollmentConfirmation, HttpError> {
        self.client
            .patch_json(&enrollment_path(username), change)
            .await
    }

    async fn create_enrollment(
        &self,
        username: &str,
        enrollment: &NewEnrollment,
    ) -> Result<EnrollmentCreated, HttpError> {
        self.client
            .post_json(&enrollment_path(username), enrollment)
            .await
    }
}

#[derive(Debug, Default)]
struct InMemoryEnrollments {
    by_user: HashMap<String, Vec<EnrollmentRecord>>,
    courses: HashMap<String, Vec<CourseMode>>,
    changes: Vec<(String, EnrollmentChange)>,
    created: Vec<(String, NewEnrollment)>,
    fail_changes: bool,
}

/// Enrollment endpoint double. Successful changes and new enrollments record
/// `staff` as the enrolling user.
#[derive(Debug, Default)]
pub struct InMemoryEnrollmentGateway {
    state: Mutex<InMemoryEnrollments>,
}

impl InMemoryEnrollmentGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_enrollments(self, username: &str, records: Vec<EnrollmentRecord>) -> Self {
        self.lock().by_user.insert(username.to_string(), records);
        self
    }

    /// Courses open for new enrollments, with the modes each one offers.
    #[must_use]
    pub fn with_course(self, course_id: &str, modes: Vec<CourseMode>) -> Self {
        self.lock().courses.insert(course_id.to_string(), modes);
        self
    }

    pub fn fail_changes(&self, fail: bool) {
        self.lock().fail_changes = fail;
    }

    #[must_use]
    pub fn changes(&self) -> Vec<(String, EnrollmentChange)> {
        self.lock().changes.clone()
    }

    #[must_use]
    pub fn created(&self) -> Vec<(String, NewEnrollment)> {
        self.lock().created.clone()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryEnrollments> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EnrollmentGateway for InMemoryEnrollmentGateway {
    async fn list_enrollments(&self, username: &str) -> Result<Vec<EnrollmentRecord>, HttpError> {
        self.lock()
            .by_user
            .get(username)
            .cloned()
            .ok_or(HttpError::NotFound)
    }

    async fn change_enrollment(
        &self,
        username: &str,
        change: &EnrollmentChange,
    ) -> Result<EnrollmentConfirmation, HttpError> {
        let mut state = self.lock();
        state.changes.push((username.to_string(), change.clone()));
        if state.fail_changes {
            return Err(HttpError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        let record = state
            .by_user
            .get_mut(username)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record.course_id == change.course_id)
            })
            .ok_or(HttpError::NotFound)?;
        record.mode = change.new_mode.clone();
        record.manual_enrollment = ManualEnrollment {
            enrolled_by: Some("staff".into()),
            reason: Some(change.reason.clone()),
        };
        Ok(EnrollmentConfirmation {
            mode: record.mode.clone(),
            manual_enrollment: record.manual_enrollment.clone(),
        })
    }

    async fn create_enrollment(
        &self,
        username: &str,
        enrollment: &NewEnrollment,
    ) -> Result<EnrollmentCreated, HttpError> {
        let mut state = self.lock();
        let modes = state
            .courses
            .get(&enrollment.course_id)
            .filter(|modes| modes.iter().any(|mode| mode.slug == enrollment.mode))
            .cloned()
            .ok_or(HttpError::Status(StatusCode::BAD_REQUEST))?;
        let records = state.by_user.entry(username.to_string()).or_default();
        if records
            .iter()
            .any(|record| record.course_id == enrollment.course_id)
        {
            return Err(HttpError::Status(StatusCode::BAD_REQUEST));
        }
        let manual_enrollment = ManualEnrollment {
            enrolled_by: Some("staff".into()),
            reason: Some(enrollment.reason.clone()),
        };
        records.push(EnrollmentRecord {
            manual_enrollment: manual_enrollment.clone(),
            course_modes: modes,
            ..EnrollmentRecord::new(enrollment.course_id.clone(), enrollment.mode.clone())
        });
        state
            .created
            .push((username.to_string(), enrollment.clone()));
        Ok(EnrollmentCreated {
            enrolled_by: manual_enrollment.enrolled_by,
            enrolled_email: None,
            reason: manual_enrollment.reason,
        })
    }
}

/// One learner enrollment, shared between the views that show it.
///
/// `update_enrollment` applies the new mode immediately, then either keeps the
/// server's confirmation or restores the previous values. One change runs at
/// a time; a second one is refused until the first settles.
pub struct EnrollmentModel {
    username: String,
    record: Mutex<EnrollmentRecord>,
    changing: AtomicBool,
    gateway: Arc<dyn EnrollmentGateway>,
}

/// Restores the snapshot unless the change was confirmed, and frees the model
/// for the next change. Runs on error and when the request is dropped.
struct PendingChange<'a> {
    model: &'a EnrollmentModel,
    snapshot: Option<EnrollmentSnapshot>,
}

impl Drop for PendingChange<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.model.lock().rollback(snapshot);
        }
        self.model.changing.store(false, Ordering::Release);
    }
}

impl EnrollmentModel {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        record: EnrollmentRecord,
        gateway: Arc<dyn EnrollmentGateway>,
    ) -> Self {
        Self {
            username: username.into(),
            record: Mutex::new(record),
            changing: AtomicBool::new(false),
            gateway,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn course_id(&self) -> String {
        self.lock().course_id.clone()
    }

    #[must_use]
    pub fn mode(&self) -> String {
        self.lock().mode.clone()
    }

    #[must_use]
    pub fn manual_enrollment(&self) -> ManualEnrollment {
        self.lock().manual_enrollment.clone()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn record(&self) -> EnrollmentRecord {
        self.lock().clone()
    }

    /// Move the learner to `new_mode`.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Enrollment` for a blank mode or reason,
    /// or while another change is in flight (nothing is sent), or
    /// `EnrollmentServiceError::Http` when the server rejects the change, in
    /// which case mode and manual enrollment are restored.
    pub async fn update_enrollment(
        &self,
        new_mode: &str,
        reason: &str,
    ) -> Result<EnrollmentConfirmation, EnrollmentServiceError> {
        if self
            .changing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(EnrollmentError::ChangeInProgress.into());
        }
        let mut pending = PendingChange {
            model: self,
            snapshot: None,
        };
        let (change, snapshot) = self.lock().begin_change(new_mode, reason)?;
        pending.snapshot = Some(snapshot);

        match self.gateway.change_enrollment(&self.username, &change).await {
            Ok(confirmed) => {
                info!(
                    username = %self.username,
                    course_id = %change.course_id,
                    mode = %confirmed.mode,
                    "enrollment mode changed"
                );
                pending.snapshot = None;
                self.lock().commit(confirmed.clone());
                Ok(confirmed)
            }
            Err(err) => {
                warn!(
                    username = %self.username,
                    course_id = %change.course_id,
                    error = %err,
                    "enrollment change failed, rolling back"
                );
                drop(pending);
                Err(err.into())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, EnrollmentRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct EnrollmentService {
    gateway: Arc<dyn EnrollmentGateway>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(gateway: Arc<dyn EnrollmentGateway>) -> Self {
        Self { gateway }
    }

    /// One model per enrollment of `username`.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Http` when the list request fails.
    pub async fn load_models(
        &self,
        username: &str,
    ) -> Result<Vec<Arc<EnrollmentModel>>, EnrollmentServiceError> {
        let records = self.gateway.list_enrollments(username).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                Arc::new(EnrollmentModel::new(
                    username,
                    record,
                    Arc::clone(&self.gateway),
                ))
            })
            .collect())
    }

    /// Enroll `username` in a course with an audit reason.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Enrollment` for a blank course, mode or
    /// reason (nothing is sent), or `EnrollmentServiceError::Http` when the
    /// server refuses, e.g. 400 for an invalid mode or an existing enrollment.
    pub async fn create_enrollment(
        &self,
        username: &str,
        course_id: &str,
        mode: &str,
        reason: &str,
    ) -> Result<EnrollmentCreated, EnrollmentServiceError> {
        let enrollment = NewEnrollment::new(course_id, mode, reason)?;
        match self.gateway.create_enrollment(username, &enrollment).await {
            Ok(created) => {
                info!(
                    %username,
                    course_id = %enrollment.course_id,
                    mode = %enrollment.mode,
                    "enrollment created"
                );
                Ok(created)
            }
            Err(err) => {
                warn!(
                    %username,
                    course_id = %enrollment.course_id,
                    error = %err,
                    "enrollment could not be created"
                );
                Err(err.into())
            }
        }
    }
}
