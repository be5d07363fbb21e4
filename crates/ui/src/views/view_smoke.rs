use std::sync::Arc;

use services::demographics::{DemographicsCall, InMemoryDemographicsGateway};
use support_core::model::{FieldChoiceCatalog, UserId};

use super::test_harness::{
    TEST_COURSE, TEST_USER, TestBackends, ViewKind, setup_view_harness, setup_view_harness_with,
};

#[tokio::test(flavor = "current_thread")]
async fn prompt_view_smoke_renders_call_to_action() {
    let mut harness = setup_view_harness(ViewKind::Prompt);
    harness.settle().await;
    let html = harness.render();
    assert!(
        html.contains("Want to make edX better for everyone?"),
        "missing call to action in {html}"
    );
    assert!(html.contains("Get started"), "missing start button in {html}");
    assert!(!html.contains("demographics-modal"), "modal opened early in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn prompt_view_smoke_asks_signed_out_learner_to_sign_in() {
    let mut harness = setup_view_harness_with(ViewKind::Prompt, TestBackends::signed_out());
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Sign in"), "missing sign in notice in {html}");
    assert!(!html.contains("Get started"), "call to action leaked in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn modal_smoke_renders_first_question_page() {
    let mut harness = setup_view_harness(ViewKind::Modal);
    harness.settle().await;
    let html = harness.render();
    assert!(
        html.contains("Help make edX better for everyone!"),
        "missing header in {html}"
    );
    assert!(html.contains("1 of 5"), "missing progress in {html}");
    assert!(
        html.contains("What is your gender identity?"),
        "missing gender question in {html}"
    );
    assert!(html.contains("Prefer to self-describe"), "missing choice in {html}");
    assert!(!html.contains("Please specify"), "companion shown early in {html}");
    assert!(html.contains("Finish later"), "missing finish later in {html}");
    assert!(html.contains("Next"), "missing next in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn modal_smoke_creates_missing_record_on_load() {
    let mut harness = setup_view_harness(ViewKind::Modal);
    harness.settle().await;
    let user = harness.backends.user_id.expect("signed in");
    assert!(
        harness.backends.demographics.record(user).is_some(),
        "record was not created"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn modal_smoke_renders_error_page_when_choices_fail() {
    let backends = TestBackends {
        demographics: Arc::new(
            InMemoryDemographicsGateway::new(FieldChoiceCatalog::new()).failing_choices(),
        ),
        ..TestBackends::sample()
    };
    let mut harness = setup_view_harness_with(ViewKind::Modal, backends);
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Something went wrong"), "missing error page in {html}");
    assert!(html.contains("Close"), "missing close in {html}");
    assert!(!html.contains("Next"), "next leaked in {html}");
    assert!(
        !html.contains("What is your gender identity?"),
        "question leaked in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn inspector_smoke_renders_search_form() {
    let mut harness = setup_view_harness(ViewKind::Inspector);
    harness.settle().await;
    let html = harness.render();
    assert!(
        html.contains("Search For A Masters Learner Below"),
        "missing form title in {html}"
    );
    assert!(
        html.contains("edX account username or email"),
        "missing edX user label in {html}"
    );
    assert!(html.contains("test_org"), "missing org key option in {html}");
    assert!(!html.contains("Search Results"), "results shown early in {html}");
    assert!(!html.contains("but not both"), "alert shown early in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn enrollments_smoke_lists_current_track() {
    let mut harness = setup_view_harness(ViewKind::Enrollments);
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains(TEST_COURSE), "missing course in {html}");
    assert!(html.contains("Audit"), "missing track name in {html}");
    assert!(
        html.contains("Verified Certificate"),
        "missing target track in {html}"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn modal_smoke_failed_save_shows_banner_and_freezes_answers() {
    let mut harness = setup_view_harness_with(ViewKind::FailedSave, TestBackends::failing_saves());
    harness.settle().await;
    let html = harness.render();
    assert!(
        html.contains(
            "An error occurred while attempting to save your answers. Please try again later."
        ),
        "missing field error banner in {html}"
    );
    assert!(html.contains("disabled"), "inputs still enabled in {html}");
    assert!(!html.contains("disabled=false"), "an input stayed enabled in {html}");
    assert!(html.contains("Please specify"), "earlier answer lost in {html}");
    assert!(html.contains("poet"), "earlier description lost in {html}");
    assert!(
        harness
            .backends
            .demographics
            .calls()
            .iter()
            .any(|call| matches!(call, DemographicsCall::PatchField(user, _) if *user == UserId::new(TEST_USER))),
        "save was never attempted"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn enrollments_smoke_offers_create_form_for_selected_learner() {
    let mut harness = setup_view_harness(ViewKind::Enrollments);
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Create enrollment"), "missing create form in {html}");
    assert!(html.contains("Course ID"), "missing course input in {html}");
    assert!(!html.contains("Enrolled learner"), "status shown early in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn enrollments_smoke_hides_create_form_without_learner() {
    let mut harness = setup_view_harness_with(ViewKind::Enrollments, TestBackends::signed_out());
    harness.settle().await;
    let html = harness.render();
    assert!(!html.contains("Create enrollment"), "create form leaked in {html}");
}
