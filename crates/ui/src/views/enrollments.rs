use std::sync::Arc;

use dioxus::prelude::*;
use services::{EnrollmentServiceError, HttpError};

use crate::context::AppContext;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{EnrollmentHandle, EnrollmentRowVm};

/// Support page for moving a learner between course modes.
#[component]
pub fn EnrollmentSupportView() -> Element {
    let ctx = use_context::<AppContext>();
    let enrollments = ctx.enrollments();

    let mut draft = use_signal(|| ctx.username().unwrap_or_default());
    let mut username = use_signal(|| ctx.username().unwrap_or_default());

    let mut resource = use_resource(move || {
        let enrollments = Arc::clone(&enrollments);
        let username = username();
        async move {
            if username.trim().is_empty() {
                return Ok(Vec::new());
            }
            let models = enrollments
                .load_models(username.trim())
                .await
                .map_err(ViewError::from)?;
            Ok(models.into_iter().map(EnrollmentHandle).collect::<Vec<_>>())
        }
    });
    let state = view_state_from_resource(&resource);

    rsx! {
        div { class: "page enrollments",
            h2 { "Enrollments" }
            form {
                class: "enrollment-lookup",
                onsubmit: move |evt| {
                    evt.prevent_default();
                    username.set(draft());
                },
                label { r#for: "enrollment_user", "Username or email" }
                input {
                    id: "enrollment_user",
                    r#type: "text",
                    value: "{draft}",
                    oninput: move |evt| draft.set(evt.value()),
                }
                button { class: "btn btn-primary", r#type: "submit", "Search" }
            }

            if !username().trim().is_empty() {
                CreateEnrollmentForm {
                    username: username().trim().to_string(),
                    on_created: move |()| resource.restart(),
                }
            }

            match state {
                ViewState::Idle | ViewState::Loading => rsx! {
                    p { "Loading..." }
                },
                ViewState::Ready(models) => rsx! {
                    if models.is_empty() {
                        p { "No enrollments to show." }
                    } else {
                        table { class: "enrollment-table",
                            thead {
                                tr {
                                    th { "Course" }
                                    th { "Track" }
                                    th { "Last changed by" }
                                    th { "Reason" }
                                    th { "Change track" }
                                }
                            }
                            tbody {
                                for model in models {
                                    EnrollmentRow { key: "{model.0.course_id()}", model }
                                }
                            }
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
            }
        }
    }
}

#[component]
fn EnrollmentRow(model: EnrollmentHandle) -> Element {
    let mut row = use_signal(|| EnrollmentRowVm::from(&model.0.record()));
    let mut new_mode = use_signal(String::new);
    let mut reason = use_signal(String::new);
    let mut status = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);

    let on_change = move |_: MouseEvent| {
        let model = Arc::clone(&model.0);
        let target = if new_mode().is_empty() {
            row.read()
                .other_modes
                .first()
                .map(|mode| mode.slug.clone())
                .unwrap_or_default()
        } else {
            new_mode()
        };
        let why = reason();
        saving.set(true);
        spawn(async move {
            let outcome = model.update_enrollment(&target, &why).await;
            row.set(EnrollmentRowVm::from(&model.record()));
            let message = match outcome {
                Ok(confirmed) => {
                    reason.set(String::new());
                    new_mode.set(String::new());
                    format!("Enrollment changed to {}.", confirmed.mode)
                }
                Err(EnrollmentServiceError::Enrollment(err)) => err.to_string(),
                Err(_) => {
                    "The change could not be saved; the enrollment was left as it was.".to_string()
                }
            };
            status.set(Some(message));
            saving.set(false);
        });
    };

    let vm = row();
    let enrolled_by = vm.enrolled_by.clone().unwrap_or_else(|| "N/A".to_string());
    let manual_reason = vm.reason.clone().unwrap_or_else(|| "N/A".to_string());

    rsx! {
        tr {
            td { "{vm.course_id}" }
            td { "{vm.mode_name}" }
            td { "{enrolled_by}" }
            td { "{manual_reason}" }
            td {
                if vm.other_modes.is_empty() {
                    span { "No other tracks" }
                } else {
                    select {
                        value: "{new_mode}",
                        onchange: move |evt| new_mode.set(evt.value()),
                        for mode in vm.other_modes.clone() {
                            option { key: "{mode.slug}", value: "{mode.slug}", "{mode.name}" }
                        }
                    }
                    input {
                        r#type: "text",
                        placeholder: "Reason",
                        value: "{reason}",
                        oninput: move |evt| reason.set(evt.value()),
                    }
                    button {
                        class: "btn",
                        r#type: "button",
                        disabled: saving(),
                        onclick: on_change,
                        "Change"
                    }
                }
                if let Some(message) = status() {
                    p { class: "enrollment-status", "{message}" }
                }
            }
        }
    }
}

const CREATE_REFUSED: &str =
    "The enrollment could not be created. Check the course and mode, and that the learner is not already enrolled.";

/// Enrolls the learner in a new course with an audit reason.
#[component]
fn CreateEnrollmentForm(username: String, on_created: Callback<()>) -> Element {
    let ctx = use_context::<AppContext>();
    let mut course_id = use_signal(String::new);
    let mut mode = use_signal(String::new);
    let mut reason = use_signal(String::new);
    let mut status = use_signal(|| None::<String>);
    let mut saving = use_signal(|| false);

    let on_create = move |_: MouseEvent| {
        let enrollments = ctx.enrollments();
        let username = username.clone();
        let (course, track, why) = (course_id(), mode(), reason());
        saving.set(true);
        spawn(async move {
            let outcome = enrollments
                .create_enrollment(&username, &course, &track, &why)
                .await;
            let message = match outcome {
                Ok(_) => {
                    course_id.set(String::new());
                    mode.set(String::new());
                    reason.set(String::new());
                    on_created.call(());
                    format!("Enrolled {username} in {}.", course.trim())
                }
                Err(EnrollmentServiceError::Enrollment(err)) => err.to_string(),
                Err(EnrollmentServiceError::Http(HttpError::Status(code)))
                    if code.as_u16() == 400 =>
                {
                    CREATE_REFUSED.to_string()
                }
                Err(err) => ViewError::from(err).message().to_string(),
            };
            status.set(Some(message));
            saving.set(false);
        });
    };

    rsx! {
        fieldset { class: "enrollment-create",
            legend { "Create enrollment" }
            input {
                r#type: "text",
                placeholder: "Course ID",
                value: "{course_id}",
                oninput: move |evt| course_id.set(evt.value()),
            }
            input {
                r#type: "text",
                placeholder: "Mode",
                value: "{mode}",
                oninput: move |evt| mode.set(evt.value()),
            }
            input {
                r#type: "text",
                placeholder: "Reason",
                value: "{reason}",
                oninput: move |evt| reason.set(evt.value()),
            }
            button {
                class: "btn btn-primary",
                r#type: "button",
                disabled: saving(),
                onclick: on_create,
                "Create"
            }
            if let Some(message) = status() {
                p { class: "enrollment-status", "{message}" }
            }
        }
    }
}
