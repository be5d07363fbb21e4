use std::sync::Arc;

use tracing::{info, warn};

use support_core::model::{
    DemographicsAnswers, DemographicsRecord, FieldChoiceCatalog, FieldPatch, UserId,
};

use crate::error::{DemographicsServiceError, HttpError};

use super::{DemographicsGateway, DemographicsStatus};

/// Everything the collection modal needs before it can render its pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicsBootstrap {
    pub catalog: FieldChoiceCatalog,
    pub answers: DemographicsAnswers,
}

#[derive(Clone)]
pub struct DemographicsService {
    gateway: Arc<dyn DemographicsGateway>,
}

impl DemographicsService {
    #[must_use]
    pub fn new(gateway: Arc<dyn DemographicsGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch choices and answers together. A learner without a record gets an
    /// empty one created on the spot.
    ///
    /// # Errors
    ///
    /// Returns `DemographicsServiceError` when either request fails.
    pub async fn load(
        &self,
        user: UserId,
    ) -> Result<DemographicsBootstrap, DemographicsServiceError> {
        let (catalog, record) =
            tokio::join!(self.gateway.fetch_choices(), self.fetch_or_create(user));
        let catalog = catalog?;
        let record = record?;
        Ok(DemographicsBootstrap {
            catalog,
            answers: DemographicsAnswers::from_record(&record),
        })
    }

    /// Persist one answer.
    ///
    /// # Errors
    ///
    /// Returns `DemographicsServiceError::Http` when the PATCH fails.
    pub async fn save_field(
        &self,
        user: UserId,
        patch: &FieldPatch,
    ) -> Result<(), DemographicsServiceError> {
        match self.gateway.patch_field(user, patch).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(
                    %user,
                    field = %patch.field(),
                    error = %err,
                    "failed to save demographics field"
                );
                Err(err.into())
            }
        }
    }

    /// # Errors
    ///
    /// Returns `DemographicsServiceError::Http` when the status request fails.
    pub async fn call_to_action_visible(&self) -> Result<bool, DemographicsServiceError> {
        Ok(self.gateway.fetch_status().await?.show_call_to_action)
    }

    /// Stop inviting the learner. Runs when they finish the modal.
    ///
    /// # Errors
    ///
    /// Returns `DemographicsServiceError::Http` when the status update fails.
    pub async fn dismiss_call_to_action(&self) -> Result<(), DemographicsServiceError> {
        let status = DemographicsStatus {
            show_call_to_action: false,
        };
        self.gateway.update_status(&status).await?;
        info!("demographics call to action dismissed");
        Ok(())
    }

    async fn fetch_or_create(
        &self,
        user: UserId,
    ) -> Result<DemographicsRecord, HttpError> {
        match self.gateway.fetch_record(user).await {
            Err(HttpError::NotFound) => {
                info!(%user, "no demographics record, creating one");
                self.gateway.create_record(user).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::{DemographicsCall, InMemoryDemographicsGateway};
    use support_core::model::{Choice, DemographicsField, EthnicityEntry, FieldValue};

    fn catalog() -> FieldChoiceCatalog {
        let mut catalog = FieldChoiceCatalog::new();
        catalog.insert("gender", vec![Choice::new("woman", "Woman")]);
        catalog
    }

    #[tokio::test]
    async fn load_creates_missing_record() {
        let gateway = Arc::new(InMemoryDemographicsGateway::new(catalog()));
        let service = DemographicsService::new(gateway.clone());
        let user = UserId::new(11);

        let bootstrap = service.load(user).await.unwrap();
        assert_eq!(bootstrap.answers, DemographicsAnswers::default());
        assert_eq!(bootstrap.catalog.choices_for(DemographicsField::Gender).len(), 1);
        let calls = gateway.calls();
        assert!(calls.contains(&DemographicsCall::FetchChoices));
        assert!(calls.contains(&DemographicsCall::CreateRecord(user)));
    }

    #[tokio::test]
    async fn load_maps_existing_ethnicity() {
        let user = UserId::new(11);
        let mut record = DemographicsRecord::empty_for(user);
        record.user_ethnicity = vec![EthnicityEntry {
            ethnicity: "asian".into(),
        }];
        let gateway = Arc::new(InMemoryDemographicsGateway::new(catalog()).with_record(record));
        let service = DemographicsService::new(gateway.clone());

        let bootstrap = service.load(user).await.unwrap();
        assert_eq!(bootstrap.answers.user_ethnicity, vec!["asian".to_string()]);
        assert!(!gateway.calls().contains(&DemographicsCall::CreateRecord(user)));
    }

    #[tokio::test]
    async fn load_fails_when_choices_fail() {
        let gateway = Arc::new(InMemoryDemographicsGateway::new(catalog()).failing_choices());
        let service = DemographicsService::new(gateway);
        assert!(service.load(UserId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn save_field_reports_failure() {
        let user = UserId::new(3);
        let gateway = Arc::new(
            InMemoryDemographicsGateway::new(catalog())
                .with_record(DemographicsRecord::empty_for(user)),
        );
        let service = DemographicsService::new(gateway.clone());
        let patch = FieldPatch::new(DemographicsField::Gender, FieldValue::text("woman"));

        service.save_field(user, &patch).await.unwrap();
        assert_eq!(gateway.record(user).unwrap().gender.as_deref(), Some("woman"));

        gateway.fail_patches(true);
        assert!(matches!(
            service.save_field(user, &patch).await,
            Err(DemographicsServiceError::Http(HttpError::Status(_)))
        ));
    }

    #[tokio::test]
    async fn dismiss_hides_call_to_action() {
        let gateway = Arc::new(InMemoryDemographicsGateway::new(catalog()));
        let service = DemographicsService::new(gateway);
        assert!(service.call_to_action_visible().await.unwrap());
        service.dismiss_call_to_action().await.unwrap();
        assert!(!service.call_to_action_visible().await.unwrap());
    }
}
