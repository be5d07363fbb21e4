use std::sync::Arc;

use support_core::auth::JwtClaims;
use support_core::model::{
    Choice, CourseMode, DemographicsField, EnrollmentRecord, FieldChoiceCatalog, LearnerInfo,
    UserAccount, ETHNICITY_CHOICES_PATH,
};

use crate::config::SupportConfig;
use crate::demographics::{
    DemographicsService, HttpDemographicsGateway, InMemoryDemographicsGateway,
};
use crate::enrollment_service::{
    EnrollmentService, HttpEnrollmentGateway, InMemoryEnrollmentGateway,
};
use crate::error::{AppServicesError, HttpError};
use crate::http::LmsClient;
use crate::inspector_service::{HttpInspectorGateway, InMemoryInspectorGateway, InspectorService};

/// Assembles the services the UI and the command line call into.
#[derive(Clone)]
pub struct AppServices {
    client: Option<LmsClient>,
    demographics: Arc<DemographicsService>,
    enrollments: Arc<EnrollmentService>,
    inspector: Arc<InspectorService>,
}

impl AppServices {
    /// Build services that talk to the configured LMS.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the http client cannot be built.
    pub fn new_http(config: &SupportConfig) -> Result<Self, AppServicesError> {
        let client = LmsClient::new(config)?;
        Ok(Self {
            demographics: Arc::new(DemographicsService::new(Arc::new(
                HttpDemographicsGateway::new(client.clone()),
            ))),
            enrollments: Arc::new(EnrollmentService::new(Arc::new(HttpEnrollmentGateway::new(
                client.clone(),
            )))),
            inspector: Arc::new(InspectorService::new(Arc::new(HttpInspectorGateway::new(
                client.clone(),
            )))),
            client: Some(client),
        })
    }

    /// Build services over in-memory gateways seeded with a sample learner.
    #[must_use]
    pub fn offline(username: &str) -> Self {
        let enrollments = InMemoryEnrollmentGateway::new().with_enrollments(
            username,
            vec![EnrollmentRecord {
                course_modes: vec![
                    CourseMode {
                        slug: "audit".into(),
                        name: "Audit".into(),
                    },
                    CourseMode {
                        slug: "verified".into(),
                        name: "Verified Certificate".into(),
                    },
                ],
                ..EnrollmentRecord::new("course-v1:edX+DemoX+Demo_Course", "audit")
            }],
        )
        .with_course(
            "course-v1:edX+DemoX+Demo_Course",
            vec![
                CourseMode {
                    slug: "audit".into(),
                    name: "Audit".into(),
                },
                CourseMode {
                    slug: "verified".into(),
                    name: "Verified Certificate".into(),
                },
            ],
        )
        .with_course(
            "course-v1:edX+Intro+2024",
            vec![CourseMode {
                slug: "audit".into(),
                name: "Audit".into(),
            }],
        );
        let inspector = InMemoryInspectorGateway::new(vec!["test_org".into()]).with_learner(
            LearnerInfo {
                user: Some(UserAccount {
                    username: Some(username.to_string()),
                    email: Some(format!("{username}@example.com")),
                    ..UserAccount::default()
                }),
                ..LearnerInfo::default()
            },
        );
        Self {
            client: None,
            demographics: Arc::new(DemographicsService::new(Arc::new(
                InMemoryDemographicsGateway::new(sample_catalog()),
            ))),
            enrollments: Arc::new(EnrollmentService::new(Arc::new(enrollments))),
            inspector: Arc::new(InspectorService::new(Arc::new(inspector))),
        }
    }

    /// Claims of the signed-in user; always `None` offline.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` when the JWT cookie cannot be read or refreshed.
    pub async fn authenticated_user(&self) -> Result<Option<JwtClaims>, HttpError> {
        match &self.client {
            Some(client) => client.authenticated_user().await,
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn demographics(&self) -> Arc<DemographicsService> {
        Arc::clone(&self.demographics)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn inspector(&self) -> Arc<InspectorService> {
        Arc::clone(&self.inspector)
    }
}

fn sample_catalog() -> FieldChoiceCatalog {
    let options = |pairs: &[(&str, &str)]| {
        pairs
            .iter()
            .map(|(value, name)| Choice::new(*value, *name))
            .collect::<Vec<_>>()
    };
    let mut catalog = FieldChoiceCatalog::new();
    catalog.insert(
        DemographicsField::Gender.as_str(),
        options(&[
            ("woman", "Woman"),
            ("man", "Man"),
            ("nonbinary", "Non-binary"),
            ("self-describe", "Prefer to self-describe"),
            ("declined", "Prefer not to respond"),
        ]),
    );
    catalog.insert(
        ETHNICITY_CHOICES_PATH,
        options(&[
            ("american-indian-or-alaskan-native", "American Indian or Alaska Native"),
            ("asian", "Asian"),
            ("black-or-african-american", "Black or African American"),
            ("hispanic-latin-spanish", "Hispanic, Latin, or Spanish origin"),
            ("white", "White"),
            ("other", "Another race, ethnicity, or origin"),
            ("declined", "Prefer not to respond"),
        ]),
    );
    catalog.insert(
        DemographicsField::Income.as_str(),
        options(&[
            ("less-than-10k", "Less than $10,000"),
            ("10k-50k", "$10,000 - $49,999"),
            ("50k-100k", "$50,000 - $99,999"),
            ("100k-plus", "$100,000 or more"),
            ("declined", "Prefer not to respond"),
        ]),
    );
    catalog.insert(
        DemographicsField::MilitaryHistory.as_str(),
        options(&[
            ("yes-current", "Yes, I am currently serving"),
            ("yes-past", "Yes, I have served in the past"),
            ("no", "No"),
            ("declined", "Prefer not to respond"),
        ]),
    );
    let education = options(&[
        ("no-high-school", "No high school diploma"),
        ("high-school", "High school diploma"),
        ("bachelors", "Bachelor's degree"),
        ("masters", "Master's degree"),
        ("doctorate", "Doctorate"),
        ("declined", "Prefer not to respond"),
    ]);
    catalog.insert(DemographicsField::LearnerEducationLevel.as_str(), education.clone());
    catalog.insert(DemographicsField::ParentEducationLevel.as_str(), education);
    catalog.insert(
        DemographicsField::WorkStatus.as_str(),
        options(&[
            ("full-time", "Employed, full-time"),
            ("part-time", "Employed, part-time"),
            ("unemployed", "Unemployed"),
            ("other", "Other"),
            ("declined", "Prefer not to respond"),
        ]),
    );
    let sectors = options(&[
        ("education", "Education"),
        ("healthcare", "Healthcare"),
        ("technology", "Information technology"),
        ("declined", "Prefer not to respond"),
    ]);
    catalog.insert(DemographicsField::CurrentWorkSector.as_str(), sectors.clone());
    catalog.insert(DemographicsField::FutureWorkSector.as_str(), sectors);
    catalog
}
