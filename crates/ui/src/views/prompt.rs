use std::sync::Arc;

use dioxus::prelude::*;
use tracing::warn;

use crate::context::AppContext;
use crate::views::demographics::DemographicsCollectionModal;
use crate::views::{ViewError, ViewState, view_state_from_resource};

/// Dashboard banner inviting the learner to share demographics.
#[component]
pub fn DemographicsPromptView() -> Element {
    let ctx = use_context::<AppContext>();
    let user_id = ctx.user_id();
    let demographics = ctx.demographics();

    let mut show_modal =
        use_signal(|| user_id.is_some() && ctx.take_open_demographics_on_launch());

    let mut call_to_action = {
        let demographics = Arc::clone(&demographics);
        use_resource(move || {
            let demographics = Arc::clone(&demographics);
            async move {
                demographics
                    .call_to_action_visible()
                    .await
                    .map_err(ViewError::from)
            }
        })
    };
    let state = view_state_from_resource(&call_to_action);

    let on_dismiss = use_callback(move |()| {
        let demographics = Arc::clone(&demographics);
        spawn(async move {
            match demographics.dismiss_call_to_action().await {
                Ok(()) => call_to_action.restart(),
                Err(err) => warn!(error = %err, "could not dismiss demographics call to action"),
            }
        });
    });
    let on_close = use_callback(move |()| show_modal.set(false));

    let Some(user) = user_id else {
        return rsx! {
            div { class: "page",
                h2 { "Dashboard" }
                p { "Sign in to share your demographic information." }
            }
        };
    };

    rsx! {
        div { class: "page",
            h2 { "Dashboard" }

            match state {
                ViewState::Idle | ViewState::Loading => rsx! {},
                ViewState::Ready(true) => rsx! {
                    div { class: "demographics-cta",
                        h3 { "Want to make edX better for everyone?" }
                        p {
                            "Answer a few optional questions about yourself so we can "
                            "measure and improve access for learners everywhere."
                        }
                        button {
                            class: "btn btn-primary",
                            r#type: "button",
                            onclick: move |_| show_modal.set(true),
                            "Get started"
                        }
                    }
                },
                ViewState::Ready(false) => rsx! {
                    div { class: "demographics-cta demographics-cta-done",
                        p { "Thanks for sharing your information." }
                        button {
                            class: "btn",
                            r#type: "button",
                            onclick: move |_| show_modal.set(true),
                            "Review my answers"
                        }
                    }
                },
                ViewState::Error(err) => rsx! {
                    p { class: "error", "{err.message()}" }
                },
            }

            if show_modal() {
                DemographicsCollectionModal { user, on_dismiss, on_close }
            }
        }
    }
}
