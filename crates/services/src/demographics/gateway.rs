use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use support_core::model::{DemographicsRecord, FieldChoiceCatalog, FieldPatch, UserId};

use crate::error::HttpError;
use crate::http::LmsClient;

use super::DemographicsStatus;

const COLLECTION_PATH: &str = "/demographics/api/v1/demographics/";
const STATUS_PATH: &str = "/demographics/api/v1/demographics/status/";

fn record_path(user: UserId) -> String {
    format!("{COLLECTION_PATH}{user}/")
}

/// The demographics REST resource.
#[async_trait]
pub trait DemographicsGateway: Send + Sync {
    async fn fetch_choices(&self) -> Result<FieldChoiceCatalog, HttpError>;
    async fn fetch_record(&self, user: UserId) -> Result<DemographicsRecord, HttpError>;
    async fn create_record(&self, user: UserId) -> Result<DemographicsRecord, HttpError>;
    async fn patch_field(
        &self,
        user: UserId,
        patch: &FieldPatch,
    ) -> Result<DemographicsRecord, HttpError>;
    async fn fetch_status(&self) -> Result<DemographicsStatus, HttpError>;
    async fn update_status(
        &self,
        status: &DemographicsStatus,
    ) -> Result<DemographicsStatus, HttpError>;
}

#[derive(Clone)]
pub struct HttpDemographicsGateway {
    client: LmsClient,
}

impl HttpDemographicsGateway {
    #[must_use]
    pub fn new(client: LmsClient) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct CreateRecord {
    user: UserId,
}

#[async_trait]
impl DemographicsGateway for HttpDemographicsGateway {
    async fn fetch_choices(&self) -> Result<FieldChoiceCatalog, HttpError> {
        let body: Value = self.client.options_json(COLLECTION_PATH).await?;
        Ok(FieldChoiceCatalog::from_options_response(&body))
    }

    async fn fetch_record(&self, user: UserId) -> Result<DemographicsRecord, HttpError> {
        self.client.get_json(&record_path(user)).await
    }

    async fn create_record(&self, user: UserId) -> Result<DemographicsRecord, HttpError> {
        self.client
            .post_json(COLLECTION_PATH, &CreateRecord { user })
            .await
    }

    async fn patch_field(
        &self,
        user: UserId,
        patch: &FieldPatch,
    ) -> Result<DemographicsRecord, HttpError> {
        self.client
            .patch_json(&record_path(user), &patch.to_body())
            .await
    }

    async fn fetch_status(&self) -> Result<DemographicsStatus, HttpError> {
        self.client.get_json(STATUS_PATH).await
    }

    async fn update_status(
        &self,
        status: &DemographicsStatus,
    ) -> Result<DemographicsStatus, HttpError> {
        self.client.patch_json(STATUS_PATH, status).await
    }
}

/// A request the in-memory gateway received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemographicsCall {
    FetchChoices,
    FetchRecord(UserId),
    CreateRecord(UserId),
    PatchField(UserId, Value),
    FetchStatus,
    UpdateStatus(bool),
}

#[derive(Debug, Default)]
struct InMemoryState {
    records: HashMap<UserId, DemographicsRecord>,
    status: DemographicsStatus,
    calls: Vec<DemographicsCall>,
    fail_choices: bool,
    fail_patches: bool,
}

/// Gateway backed by a map, for tests and offline runs.
///
/// Mirrors the server: unknown users are 404 until created, patches are applied
/// field by field, and bad patch bodies are rejected with 400.
#[derive(Debug, Default)]
pub struct InMemoryDemographicsGateway {
    catalog: FieldChoiceCatalog,
    state: Mutex<InMemoryState>,
}

impl InMemoryDemographicsGateway {
    #[must_use]
    pub fn new(catalog: FieldChoiceCatalog) -> Self {
        Self {
            catalog,
            state: Mutex::new(InMemoryState {
                status: DemographicsStatus {
                    show_call_to_action: true,
                },
                ..InMemoryState::default()
            }),
        }
    }

    #[must_use]
    pub fn with_record(self, record: DemographicsRecord) -> Self {
        if let Some(user) = record.user {
            self.lock().records.insert(user, record);
        }
        self
    }

    /// Make every OPTIONS request fail with 500.
    #[must_use]
    pub fn failing_choices(self) -> Self {
        self.lock().fail_choices = true;
        self
    }

    /// Make every PATCH of a field fail with 500.
    pub fn fail_patches(&self, fail: bool) {
        self.lock().fail_patches = fail;
    }

    #[must_use]
    pub fn record(&self, user: UserId) -> Option<DemographicsRecord> {
        self.lock().records.get(&user).cloned()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DemographicsCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DemographicsGateway for InMemoryDemographicsGateway {
    async fn fetch_choices(&self) -> Result<FieldChoiceCatalog, HttpError> {
        let mut state = self.lock();
        state.calls.push(DemographicsCall::FetchChoices);
        if state.fail_choices {
            return Err(HttpError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(self.catalog.clone())
    }

    async fn fetch_record(&self, user: UserId) -> Result<DemographicsRecord, HttpError> {
        let mut state = self.lock();
        state.calls.push(DemographicsCall::FetchRecord(user));
        state.records.get(&user).cloned().ok_or(HttpError::NotFound)
    }

    async fn create_record(&self, user: UserId) -> Result<DemographicsRecord, HttpError> {
        let mut state = self.lock();
        state.calls.push(DemographicsCall::CreateRecord(user));
        let record = state
            .records
            .entry(user)
            .or_insert_with(|| DemographicsRecord::empty_for(user));
        Ok(record.clone())
    }

    async fn patch_field(
        &self,
        user: UserId,
        patch: &FieldPatch,
    ) -> Result<DemographicsRecord, HttpError> {
        let body = patch.to_body();
        let mut state = self.lock();
        state
            .calls
            .push(DemographicsCall::PatchField(user, body.clone()));
        if state.fail_patches {
            return Err(HttpError::Status(StatusCode::INTERNAL_SERVER_ERROR));
        }
        let record = state.records.get_mut(&user).ok_or(HttpError::NotFound)?;
        record.apply_patch(&body).map_err(|err| {
            debug!(%err, "rejecting demographics patch");
            HttpError::Status(StatusCode::BAD_REQUEST)
        })?;
        Ok(record.clone())
    }

    async fn fetch_status(&self) -> Result<DemographicsStatus, HttpError> {
        let mut state = self.lock();
        state.calls.push(DemographicsCall::FetchStatus);
        Ok(state.status.clone())
    }

    async fn update_status(
        &self,
        status: &DemographicsStatus,
    ) -> Result<DemographicsStatus, HttpError> {
        let mut state = self.lock();
        state
            .calls
            .push(DemographicsCall::UpdateStatus(status.show_call_to_action));
        state.status = status.clone();
        Ok(state.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use support_core::model::{DemographicsField, FieldValue};

    #[test]
    fn record_path_ends_with_slash() {
        assert_eq!(
            record_path(UserId::new(42)),
            "/demographics/api/v1/demographics/42/"
        );
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_until_created() {
        let gateway = InMemoryDemographicsGateway::new(FieldChoiceCatalog::new());
        let user = UserId::new(7);
        assert!(matches!(
            gateway.fetch_record(user).await,
            Err(HttpError::NotFound)
        ));
        let created = gateway.create_record(user).await.unwrap();
        assert_eq!(created, DemographicsRecord::empty_for(user));
        assert!(gateway.fetch_record(user).await.is_ok());
    }

    #[tokio::test]
    async fn patch_applies_and_records_body() {
        let user = UserId::new(7);
        let gateway = InMemoryDemographicsGateway::new(FieldChoiceCatalog::new())
            .with_record(DemographicsRecord::empty_for(user));
        let patch = FieldPatch::new(DemographicsField::Income, FieldValue::text("default"));
        let record = gateway.patch_field(user, &patch).await.unwrap();
        assert_eq!(record.income, None);
        assert_eq!(
            gateway.calls().last(),
            Some(&DemographicsCall::PatchField(user, json!({"income": null})))
        );
    }

    #[tokio::test]
    async fn injected_patch_failure_leaves_record_alone() {
        let user = UserId::new(7);
        let gateway = InMemoryDemographicsGateway::new(FieldChoiceCatalog::new())
            .with_record(DemographicsRecord::empty_for(user));
        gateway.fail_patches(true);
        let patch = FieldPatch::new(DemographicsField::Gender, FieldValue::text("woman"));
        assert!(gateway.patch_field(user, &patch).await.is_err());
        assert_eq!(gateway.record(user).unwrap().gender, None);
    }
}
