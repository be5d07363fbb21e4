use std::sync::Arc;

use dioxus::prelude::*;
use services::DemographicsBootstrap;
use support_core::model::{DemographicsField, DemographicsForm, FieldPatch, FieldValue, UserId};
use tracing::warn;

use super::pages::{FormHandlers, demographics_error_pages, demographics_pages};
use crate::context::AppContext;
use crate::views::wizard::Wizard;
use crate::views::{ViewError, ViewState, view_state_from_resource};

/// Loads the learner's answers, then hands them to the wizard.
///
/// `on_dismiss` runs when the learner finishes on the closer page, before
/// `on_close`.
#[component]
pub fn DemographicsCollectionModal(
    user: UserId,
    on_dismiss: Callback<()>,
    on_close: Callback<()>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let demographics = ctx.demographics();

    let resource = use_resource(move || {
        let demographics = Arc::clone(&demographics);
        async move { demographics.load(user).await.map_err(ViewError::from) }
    });

    let body = match view_state_from_resource(&resource) {
        ViewState::Idle | ViewState::Loading => rsx! {
            div { class: "demographics-loading", role: "status", "Loading..." }
        },
        ViewState::Ready(bootstrap) => rsx! {
            DemographicsQuestions { user, bootstrap, on_dismiss, on_close }
        },
        ViewState::Error(err) => rsx! {
            Wizard {
                pages: demographics_error_pages(err.message()),
                error: true,
                on_dismiss,
                on_wizard_complete: on_close,
            }
        },
    };

    rsx! {
        div { class: "editor-modal-overlay",
            div {
                class: "editor-modal demographics-modal",
                role: "dialog",
                onclick: move |evt| evt.stop_propagation(),
                {body}
            }
        }
    }
}

#[component]
fn DemographicsQuestions(
    user: UserId,
    bootstrap: DemographicsBootstrap,
    on_dismiss: Callback<()>,
    on_close: Callback<()>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let demographics = ctx.demographics();
    let mut form = use_signal(|| DemographicsForm::new(bootstrap.answers.clone()));

    let save = use_callback(move |patch: FieldPatch| {
        let demographics = Arc::clone(&demographics);
        spawn(async move {
            if demographics.save_field(user, &patch).await.is_err() {
                form.write().record_field_error();
            }
        });
    });

    let on_select = use_callback(move |(field, value): (DemographicsField, String)| {
        let changed = form.write().change(field, FieldValue::Text(value));
        match changed {
            Ok(Some(patch)) => save.call(patch),
            Ok(None) => {}
            Err(err) => warn!(%err, "ignoring demographics change"),
        }
    });

    let on_toggle_ethnicity = use_callback(move |(value, checked): (String, bool)| {
        let toggled = form.write().toggle_ethnicity(&value, checked);
        if let Some(patch) = toggled {
            save.call(patch);
        }
    });

    let on_text_input = use_callback(move |(field, value): (DemographicsField, String)| {
        if let Err(err) = form.write().set_local(field, FieldValue::Text(value)) {
            warn!(%err, "ignoring demographics input");
        }
    });

    let on_text_blur = use_callback(move |field: DemographicsField| {
        let current = form.read().patch_for_current(field);
        if let Some(patch) = current {
            save.call(patch);
        }
    });

    let pages = use_hook(|| {
        demographics_pages(
            form,
            bootstrap.catalog.clone(),
            FormHandlers {
                on_select,
                on_toggle_ethnicity,
                on_text_input,
                on_text_blur,
            },
        )
    });

    rsx! {
        Wizard {
            pages,
            error: false,
            on_dismiss,
            on_wizard_complete: on_close,
        }
    }
}
