use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use support_core::model::{InspectorQuery, LearnerInfo};

use crate::error::{HttpError, InspectorServiceError};
use crate::http::LmsClient;

const DETAILS_PATH: &str = "/support/program_enrollments_inspector_details";

/// One inspector lookup as the support API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorResult {
    #[serde(rename = "learner_program_enrollments", default)]
    pub learner_info: LearnerInfo,
    /// The API sends `""` instead of a list when it has no organizations.
    #[serde(default, deserialize_with = "list_or_blank")]
    pub org_keys: Vec<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub error: Option<String>,
}

fn list_or_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

fn blank_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|message| !message.trim().is_empty()))
}

#[async_trait]
pub trait InspectorGateway: Send + Sync {
    async fn search(&self, query: &InspectorQuery) -> Result<InspectorResult, HttpError>;
    async fn org_keys(&self) -> Result<Vec<String>, HttpError>;
}

#[derive(Clone)]
pub struct HttpInspectorGateway {
    client: LmsClient,
}

impl HttpInspectorGateway {
    #[must_use]
    pub fn new(client: LmsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InspectorGateway for HttpInspectorGateway {
    async fn search(&self, query: &InspectorQuery) -> Result<InspectorResult, HttpError> {
        self.client
            .get_json_with_query(DETAILS_PATH, &query.to_pairs())
            .await
    }

    async fn org_keys(&self) -> Result<Vec<String>, HttpError> {
        let result: InspectorResult = self.client.get_json(DETAILS_PATH).await?;
        Ok(result.org_keys)
    }
}

/// Inspector backed by a fixed set of learners.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInspectorGateway {
    learners: Vec<LearnerInfo>,
    org_keys: Vec<String>,
}

impl InMemoryInspectorGateway {
    #[must_use]
    pub fn new(org_keys: Vec<String>) -> Self {
        Self {
            learners: Vec::new(),
            org_keys,
        }
    }

    #[must_use]
    pub fn with_learner(mut self, learner: LearnerInfo) -> Self {
        self.learners.push(learner);
        self
    }

    fn by_edx_user(&self, edx_user: &str) -> Option<&LearnerInfo> {
        self.learners.iter().find(|learner| {
            learner.user.as_ref().is_some_and(|user| {
                user.username.as_deref() == Some(edx_user) || user.email.as_deref() == Some(edx_user)
            })
        })
    }

    fn by_external_key(&self, org_key: &str, external_user_key: &str) -> Option<&LearnerInfo> {
        let wanted = external_user_key.to_lowercase();
        let org_prefix = format!("{org_key}:");
        self.learners.iter().find(|learner| {
            let Some(user) = learner.user.as_ref() else {
                return false;
            };
            let key_matches = user
                .external_user_key
                .as_ref()
                .is_some_and(|key| key.to_lowercase() == wanted);
            let linked_to_org = user.sso_list.as_ref().map_or(true, |records| {
                records.is_empty() || records.iter().any(|sso| sso.uid.starts_with(&org_prefix))
            });
            key_matches && linked_to_org
        })
    }
}

#[async_trait]
impl InspectorGateway for InMemoryInspectorGateway {
    async fn search(&self, query: &InspectorQuery) -> Result<InspectorResult, HttpError> {
        let edx_user = query.edx_user.trim();
        let (found, error) = if edx_user.is_empty() {
            let org_key = query.org_key.trim();
            let external_user_key = query.external_user_key.trim();
            match self.by_external_key(org_key, external_user_key) {
                Some(learner) => (learner.clone(), None),
                None => (
                    LearnerInfo::default(),
                    Some(format!(
                        "No user found for external key {external_user_key} for institution {org_key}"
                    )),
                ),
            }
        } else {
            match self.by_edx_user(edx_user) {
                Some(learner) => (learner.clone(), None),
                None => (
                    LearnerInfo::default(),
                    Some(format!("Could not find edx account with {edx_user}")),
                ),
            }
        };
        Ok(InspectorResult {
            learner_info: found,
            org_keys: self.org_keys.clone(),
            error,
        })
    }

    async fn org_keys(&self) -> Result<Vec<String>, HttpError> {
        Ok(self.org_keys.clone())
    }
}

#[derive(Clone)]
pub struct InspectorService {
    gateway: Arc<dyn InspectorGateway>,
}

impl InspectorService {
    #[must_use]
    pub fn new(gateway: Arc<dyn InspectorGateway>) -> Self {
        Self { gateway }
    }

    /// Look up a learner by exactly one identifier.
    ///
    /// # Errors
    ///
    /// Returns `InspectorServiceError::Query` without contacting the server when
    /// the query names both or neither identifier.
    pub async fn search(
        &self,
        query: &InspectorQuery,
    ) -> Result<InspectorResult, InspectorServiceError> {
        query.validate()?;
        debug!(?query, "searching program enrollments");
        let result = self.gateway.search(query).await?;
        if let Some(error) = &result.error {
            info!(%error, "inspector search found nothing");
        }
        Ok(result)
    }

    /// Organizations offered by the search form.
    ///
    /// # Errors
    ///
    /// Returns `InspectorServiceError::Http` when the request fails.
    pub async fn org_keys(&self) -> Result<Vec<String>, InspectorServiceError> {
        Ok(self.gateway.org_keys().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use support_core::model::{InspectorQueryError, SsoRecord, UserAccount};

    fn learner() -> LearnerInfo {
        LearnerInfo {
            user: Some(UserAccount {
                username: Some("learner".into()),
                email: Some("learner@example.com".into()),
                external_user_key: Some("AbCdEf123".into()),
                sso_list: Some(vec![SsoRecord {
                    uid: "test_org:AbCdEf123".into(),
                }]),
            }),
            ..LearnerInfo::default()
        }
    }

    fn service() -> InspectorService {
        let gateway = InMemoryInspectorGateway::new(vec!["test_org".into(), "tri_org".into()])
            .with_learner(learner());
        InspectorService::new(Arc::new(gateway))
    }

    #[test]
    fn parses_api_response_with_blank_fields() {
        let result: InspectorResult = serde_json::from_value(json!({
            "learner_program_enrollments": {},
            "org_keys": "",
            "error": ""
        }))
        .unwrap();
        assert_eq!(result, InspectorResult::default());
    }

    #[tokio::test]
    async fn finds_by_username_or_email() {
        let service = service();
        let by_name = service
            .search(&InspectorQuery::by_edx_user("learner"))
            .await
            .unwrap();
        assert!(by_name.error.is_none());
        let by_email = service
            .search(&InspectorQuery::by_edx_user("learner@example.com"))
            .await
            .unwrap();
        assert_eq!(by_name.learner_info, by_email.learner_info);
    }

    #[tokio::test]
    async fn external_key_match_ignores_case() {
        let result = service()
            .search(&InspectorQuery::by_external_key("test_org", "aBcDeF123"))
            .await
            .unwrap();
        assert!(!result.learner_info.is_empty());
    }

    #[tokio::test]
    async fn unknown_external_key_reports_error() {
        let result = service()
            .search(&InspectorQuery::by_external_key("test_org", "not_in_system"))
            .await
            .unwrap();
        assert!(result.learner_info.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("No user found for external key not_in_system for institution test_org")
        );
    }

    #[tokio::test]
    async fn ambiguous_query_is_rejected_before_request() {
        let query = InspectorQuery {
            edx_user: "learner".into(),
            org_key: "test_org".into(),
            external_user_key: "AbCdEf123".into(),
        };
        assert!(matches!(
            service().search(&query).await,
            Err(InspectorServiceError::Query(InspectorQueryError::AmbiguousLearner))
        ));
    }
}
