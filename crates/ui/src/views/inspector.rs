use std::sync::Arc;

use dioxus::prelude::*;
use services::InspectorServiceError;
use support_core::model::InspectorQuery;

use crate::context::AppContext;
use crate::views::ViewError;
use crate::vm::{
    AccountVm, InspectorResultVm, ProgramEnrollmentVm, VerificationVm, map_inspector_result,
};

/// Support lookup of a master's learner by edX account or institution key.
#[component]
pub fn ProgramEnrollmentsInspectorPage() -> Element {
    let ctx = use_context::<AppContext>();
    let inspector = ctx.inspector();

    let mut query = use_signal(InspectorQuery::default);
    let mut result = use_signal(InspectorResultVm::default);
    let mut searching = use_signal(|| false);

    let org_keys = {
        let inspector = Arc::clone(&inspector);
        use_resource(move || {
            let inspector = Arc::clone(&inspector);
            async move { inspector.org_keys().await.unwrap_or_default() }
        })
    };

    let on_search = use_callback(move |()| {
        let inspector = Arc::clone(&inspector);
        let mut submitted = query();
        if submitted.org_key.trim().is_empty() {
            if let Some(first) = org_keys.read().as_ref().and_then(|keys| keys.first()) {
                submitted.org_key = first.clone();
            }
        }
        searching.set(true);
        spawn(async move {
            let next = match inspector.search(&submitted).await {
                Ok(found) => map_inspector_result(&found),
                Err(InspectorServiceError::Query(err)) => InspectorResultVm {
                    error: Some(err.to_string()),
                    ..InspectorResultVm::default()
                },
                Err(err) => InspectorResultVm {
                    error: Some(ViewError::from(err).message().to_string()),
                    ..InspectorResultVm::default()
                },
            };
            result.set(next);
            searching.set(false);
        });
    });

    let vm = result();
    let current = query();
    let keys = org_keys.read().clone().unwrap_or_default();

    rsx! {
        div { class: "page inspector",
            if vm.has_results {
                h2 { " Search Results " }
            }
            if let Some(account) = vm.account.clone() {
                AccountSection { account }
            }
            if let Some(verification) = vm.verification.clone() {
                VerificationSection { verification }
            }
            if let Some(enrollments) = vm.enrollments.clone() {
                EnrollmentsSection { enrollments }
            }

            form {
                class: "inspector-form",
                onsubmit: move |evt| {
                    evt.prevent_default();
                    on_search.call(());
                },
                h2 { "Search For A Masters Learner Below" }
                if let Some(error) = vm.error.clone() {
                    div { class: "alert alert-danger", role: "alert", "{error}" }
                }
                if current.is_ambiguous() {
                    div { id: "input_alert", class: "alert alert-danger",
                        "Search either by edx username or email, or Institution user key, but not both"
                    }
                }
                div { class: "inspector-field",
                    label { r#for: "edx_user", "edX account username or email" }
                    input {
                        id: "edx_user",
                        name: "edx_user",
                        r#type: "text",
                        value: "{current.edx_user}",
                        oninput: move |evt| query.write().edx_user = evt.value(),
                    }
                }
                div { class: "inspector-field",
                    label { r#for: "org_key", "Identity-providing institution" }
                    select {
                        id: "org_key",
                        name: "org_key",
                        required: true,
                        value: "{current.org_key}",
                        onchange: move |evt| query.write().org_key = evt.value(),
                        for key in keys {
                            option {
                                key: "{key}",
                                value: "{key}",
                                selected: key == current.org_key,
                                "{key}"
                            }
                        }
                    }
                    label { r#for: "external_key",
                        "Institution user key from school. For example, GTPersonDirectoryId for GT students"
                    }
                    input {
                        id: "external_key",
                        name: "external_user_key",
                        r#type: "text",
                        value: "{current.external_user_key}",
                        oninput: move |evt| query.write().external_user_key = evt.value(),
                    }
                }
                button {
                    id: "search_button",
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: current.is_ambiguous() || searching(),
                    "Search"
                }
            }
        }
    }
}

#[component]
fn AccountSection(account: AccountVm) -> Element {
    rsx! {
        div { class: "inspector-section",
            h3 { "edX account Info" }
            div { class: "ml-5",
                div { span { class: "font-weight-bold", "Username" } ": {account.username}" }
                div { span { class: "font-weight-bold", "Email" } ": {account.email}" }
                if let Some(key) = account.external_user_key {
                    div { span { class: "font-weight-bold", "External User Key" } ": {key}" }
                }
                match account.sso_uids {
                    Some(uids) => rsx! {
                        div {
                            h4 { "List of Single Sign On Records: " }
                            ul {
                                for uid in uids {
                                    li { key: "{uid}", "{uid}" }
                                }
                            }
                        }
                    },
                    None => rsx! {
                        div { " There is no Single Sign On record associated with this user!" }
                    },
                }
            }
            hr {}
        }
    }
}

#[component]
fn VerificationSection(verification: VerificationVm) -> Element {
    rsx! {
        div { class: "inspector-section",
            h3 { "ID Verification" }
            div { class: "ml-5",
                div { span { class: "font-weight-bold", "Status" } ": {verification.status}" }
                if let Some(error) = verification.error {
                    div { span { class: "font-weight-bold", "Verification Error" } ": {error}" }
                }
                if let Some(expires) = verification.expires {
                    div {
                        span { class: "font-weight-bold", "Verification Expiration Date" }
                        ": {expires}"
                    }
                }
            }
            hr {}
        }
    }
}

#[component]
fn EnrollmentsSection(enrollments: Vec<ProgramEnrollmentVm>) -> Element {
    rsx! {
        div { class: "inspector-section",
            h3 { "Program Enrollments" }
            for enrollment in enrollments {
                div { key: "{enrollment.program_uuid}", class: "ml-5",
                    h4 {
                        span { class: "font-weight-bold", "{enrollment.program_name}" }
                        " Program ( "
                        span { class: "font-weight-bold", "{enrollment.program_uuid}" }
                        ")"
                    }
                    div { span { class: "font-weight-bold", "Status" } ": {enrollment.status}" }
                    div { span { class: "font-weight-bold", "Created" } ": {enrollment.created}" }
                    div { span { class: "font-weight-bold", "Last updated" } ": {enrollment.modified}" }
                    div {
                        span { class: "font-weight-bold", "External User Key" }
                        ": {enrollment.external_user_key}"
                    }
                    for course in enrollment.courses {
                        div { key: "{course.course_key}", class: "ml-5",
                            h4 {
                                match course.course_url {
                                    Some(url) => rsx! { a { href: "{url}", "{course.course_key}" } },
                                    None => rsx! { "{course.course_key}" },
                                }
                            }
                            div { span { class: "font-weight-bold", "Status" } ": {course.status}" }
                            div { span { class: "font-weight-bold", "Created" } ": {course.created}" }
                            div { span { class: "font-weight-bold", "Last updated" } ": {course.modified}" }
                            if let Some(linked) = course.linked {
                                div { class: "ml-5",
                                    h4 { "Linked course enrollment" }
                                    div { span { class: "font-weight-bold", "Course ID" } ": {linked.course_id}" }
                                    div { span { class: "font-weight-bold", "Is Active" } ": {linked.is_active}" }
                                    div { span { class: "font-weight-bold", "Mode / Track" } ": {linked.mode}" }
                                }
                            }
                        }
                    }
                }
            }
            hr {}
        }
    }
}
