use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::demographics::InMemoryDemographicsGateway;
use services::enrollment_service::InMemoryEnrollmentGateway;
use services::inspector_service::InMemoryInspectorGateway;
use services::{DemographicsService, EnrollmentService, InspectorService};
use support_core::model::{
    Choice, CourseMode, DemographicsAnswers, DemographicsField, DemographicsForm,
    DemographicsRecord, ETHNICITY_CHOICES_PATH, EnrollmentRecord, FieldChoiceCatalog,
    FieldPatch, FieldValue, LearnerInfo, SELF_DESCRIBE, SsoRecord, UserAccount, UserId,
};

use crate::context::{AppContext, UiApp, build_app_context};
use crate::views::demographics::{FormHandlers, demographics_pages};
use crate::views::wizard::Wizard;
use crate::views::{
    DemographicsCollectionModal, DemographicsPromptView, EnrollmentSupportView,
    ProgramEnrollmentsInspectorPage,
};

pub const TEST_USER: u64 = 7;
pub const TEST_USERNAME: &str = "learner";
pub const TEST_COURSE: &str = "course-v1:edX+DemoX+Demo_Course";
pub const TEST_OPEN_COURSE: &str = "course-v1:edX+Intro+2024";

#[derive(Clone)]
struct TestApp {
    user_id: Option<UserId>,
    demographics: Arc<DemographicsService>,
    enrollments: Arc<EnrollmentService>,
    inspector: Arc<InspectorService>,
}

impl UiApp for TestApp {
    fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn username(&self) -> Option<String> {
        self.user_id.map(|_| TEST_USERNAME.to_string())
    }

    fn open_demographics_on_launch(&self) -> bool {
        false
    }

    fn demographics(&self) -> Arc<DemographicsService> {
        Arc::clone(&self.demographics)
    }

    fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    fn inspector(&self) -> Arc<InspectorService> {
        Arc::clone(&self.inspector)
    }
}

/// In-memory backends behind the harness, reachable from tests.
pub struct TestBackends {
    pub user_id: Option<UserId>,
    pub demographics: Arc<InMemoryDemographicsGateway>,
    pub enrollments: Arc<InMemoryEnrollmentGateway>,
    pub inspector: Arc<InMemoryInspectorGateway>,
}

impl TestBackends {
    pub fn sample() -> Self {
        Self {
            user_id: Some(UserId::new(TEST_USER)),
            demographics: Arc::new(InMemoryDemographicsGateway::new(sample_catalog())),
            enrollments: Arc::new(
                InMemoryEnrollmentGateway::new()
                    .with_course(
                        TEST_OPEN_COURSE,
                        vec![CourseMode {
                            slug: "audit".into(),
                            name: "Audit".into(),
                        }],
                    )
                    .with_enrollments(
                        TEST_USERNAME,
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
                            ..EnrollmentRecord::new(TEST_COURSE, "audit")
                        }],
                    ),
            ),
            inspector: Arc::new(
                InMemoryInspectorGateway::new(vec!["test_org".into()]).with_learner(
                    LearnerInfo {
                        user: Some(UserAccount {
                            username: Some(TEST_USERNAME.into()),
                            email: Some("learner@example.com".into()),
                            external_user_key: Some("AbCdEf123".into()),
                            sso_list: Some(vec![SsoRecord {
                                uid: "test_org:AbCdEf123".into(),
                            }]),
                        }),
                        ..LearnerInfo::default()
                    },
                ),
            ),
        }
    }

    /// A stored record whose field PATCHes all fail.
    pub fn failing_saves() -> Self {
        let backends = Self::sample();
        let demographics = InMemoryDemographicsGateway::new(sample_catalog())
            .with_record(DemographicsRecord::empty_for(UserId::new(TEST_USER)));
        demographics.fail_patches(true);
        Self {
            demographics: Arc::new(demographics),
            ..backends
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user_id: None,
            ..Self::sample()
        }
    }

    fn app(&self) -> Arc<TestApp> {
        Arc::new(TestApp {
            user_id: self.user_id,
            demographics: Arc::new(DemographicsService::new(self.demographics.clone())),
            enrollments: Arc::new(EnrollmentService::new(self.enrollments.clone())),
            inspector: Arc::new(InspectorService::new(self.inspector.clone())),
        })
    }
}

fn sample_catalog() -> FieldChoiceCatalog {
    let mut catalog = FieldChoiceCatalog::new();
    catalog.insert(
        DemographicsField::Gender.as_str(),
        vec![
            Choice::new("woman", "Woman"),
            Choice::new("self-describe", "Prefer to self-describe"),
        ],
    );
    catalog.insert(
        ETHNICITY_CHOICES_PATH,
        vec![
            Choice::new("asian", "Asian"),
            Choice::new("declined", "Prefer not to respond"),
        ],
    );
    catalog
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Prompt,
    Modal,
    Inspector,
    Enrollments,
    /// Question pages after a gender answer failed to save.
    FailedSave,
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Prompt => rsx! { DemographicsPromptView {} },
        ViewKind::Modal => rsx! {
            DemographicsCollectionModal {
                user: UserId::new(TEST_USER),
                on_dismiss: move |()| {},
                on_close: move |()| {},
            }
        },
        ViewKind::Inspector => rsx! { ProgramEnrollmentsInspectorPage {} },
        ViewKind::Enrollments => rsx! { EnrollmentSupportView {} },
        ViewKind::FailedSave => rsx! { FailedSaveQuestions {} },
    }
}

/// Wires the question pages the way the modal does, then saves the gender
/// description once. A failed save freezes the form.
#[component]
fn FailedSaveQuestions() -> Element {
    let ctx = use_context::<AppContext>();
    let user = UserId::new(TEST_USER);
    let mut form = use_signal(|| {
        let mut answers = DemographicsAnswers::default();
        answers
            .set(DemographicsField::Gender, FieldValue::text(SELF_DESCRIBE))
            .expect("gender takes text");
        answers
            .set(DemographicsField::GenderDescription, FieldValue::text("poet"))
            .expect("description takes text");
        DemographicsForm::new(answers)
    });

    use_hook(move || {
        let demographics = ctx.demographics();
        spawn(async move {
            let patch = FieldPatch::new(DemographicsField::GenderDescription, FieldValue::text("poet"));
            if demographics.save_field(user, &patch).await.is_err() {
                form.write().record_field_error();
            }
        });
    });

    let pages = use_hook(|| {
        demographics_pages(
            form,
            sample_catalog(),
            FormHandlers {
                on_select: Callback::new(|_: (DemographicsField, String)| {}),
                on_toggle_ethnicity: Callback::new(|_: (String, bool)| {}),
                on_text_input: Callback::new(|_: (DemographicsField, String)| {}),
                on_text_blur: Callback::new(|_: DemographicsField| {}),
            },
        )
    });

    rsx! {
        Wizard {
            pages,
            error: false,
            on_dismiss: move |()| {},
            on_wizard_complete: move |()| {},
        }
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub backends: TestBackends,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild, then let pending resources resolve.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn setup_view_harness(view: ViewKind) -> ViewHarness {
    setup_view_harness_with(view, TestBackends::sample())
}

pub fn setup_view_harness_with(view: ViewKind, backends: TestBackends) -> ViewHarness {
    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: backends.app(),
            view,
        },
    );
    ViewHarness { dom, backends }
}
