use std::rc::Rc;

use dioxus::prelude::*;
use support_core::model::{DemographicsField, DemographicsForm, FieldChoiceCatalog};
use support_core::wizard::PageKind;

use super::fields::{CompanionText, EthnicityChecklist, SelectField};
use crate::views::wizard::PageContent;

const FIELD_ERROR: &str =
    "An error occurred while attempting to save your answers. Please try again later.";

/// Form event sinks shared by every page.
#[derive(Clone, Copy, PartialEq)]
pub struct FormHandlers {
    pub on_select: Callback<(DemographicsField, String)>,
    pub on_toggle_ethnicity: Callback<(String, bool)>,
    pub on_text_input: Callback<(DemographicsField, String)>,
    pub on_text_blur: Callback<DemographicsField>,
}

/// Header, question pages, closer and error page of the collection modal.
pub fn demographics_pages(
    form: Signal<DemographicsForm>,
    catalog: FieldChoiceCatalog,
    handlers: FormHandlers,
) -> Vec<PageKind<PageContent>> {
    let catalog = Rc::new(catalog);
    let question = |title: &'static str, body: fn(&Questions<'_>) -> Element| {
        let catalog = Rc::clone(&catalog);
        PageKind::Page(PageContent::new(move |_| {
            let form = form.read();
            let questions = Questions {
                form: &form,
                catalog: &catalog,
                handlers,
            };
            rsx! {
                section { class: "demographics-page",
                    if form.field_error() {
                        div { class: "demographics-field-error", role: "alert", "{FIELD_ERROR}" }
                    }
                    h3 { "{title}" }
                    {body(&questions)}
                }
            }
        }))
    };

    vec![
        PageKind::Header(PageContent::new(|_| {
            rsx! {
                h2 { "Help make edX better for everyone!" }
                p {
                    "Welcome! Your answers are optional and are saved as you go, "
                    "so you can finish later at any time."
                }
            }
        })),
        question("Gender", |q| {
            rsx! {
                {q.select(DemographicsField::Gender, "What is your gender identity?")}
                {q.companion(DemographicsField::GenderDescription, "Please specify")}
            }
        }),
        question("Ethnicity", |q| q.ethnicity()),
        question("Household and service", |q| {
            rsx! {
                {q.select(
                    DemographicsField::Income,
                    "What was the total combined income, during the last 12 months, of all members of your family?",
                )}
                {q.select(
                    DemographicsField::MilitaryHistory,
                    "Have you ever served on active duty in the U.S. Armed Forces, Reserves, or National Guard?",
                )}
            }
        }),
        question("Education", |q| {
            rsx! {
                {q.select(
                    DemographicsField::LearnerEducationLevel,
                    "What is the highest level of education that you have completed so far?",
                )}
                {q.select(
                    DemographicsField::ParentEducationLevel,
                    "What is the highest level of education that any of your parents or guardians have achieved?",
                )}
            }
        }),
        question("Employment", |q| {
            rsx! {
                {q.select(DemographicsField::WorkStatus, "What is your current employment status?")}
                {q.companion(DemographicsField::WorkStatusDescription, "Please specify")}
                {q.select(DemographicsField::CurrentWorkSector, "What industry do you currently work in?")}
                {q.select(DemographicsField::FutureWorkSector, "What industry do you want to work in?")}
            }
        }),
        PageKind::Closer(PageContent::new(|_| {
            rsx! {
                section { class: "demographics-page demographics-closer",
                    h3 { "Thank you! You're helping make edX better for everyone." }
                }
            }
        })),
        error_page("We couldn't load your answers."),
    ]
}

/// Pages used when the answers could not be loaded: only the error page.
pub fn demographics_error_pages(message: &'static str) -> Vec<PageKind<PageContent>> {
    vec![error_page(message)]
}

fn error_page(message: &'static str) -> PageKind<PageContent> {
    PageKind::ErrorPage(PageContent::new(move |_| {
        rsx! {
            section { class: "demographics-page demographics-error", role: "alert",
                h3 { "Something went wrong" }
                p { "{message}" }
                p { "Please try again later." }
            }
        }
    }))
}

struct Questions<'a> {
    form: &'a DemographicsForm,
    catalog: &'a FieldChoiceCatalog,
    handlers: FormHandlers,
}

impl Questions<'_> {
    fn select(&self, field: DemographicsField, label: &'static str) -> Element {
        rsx! {
            SelectField {
                field,
                label,
                choices: self.catalog.choices_for(field).to_vec(),
                value: self.form.answers().text(field).to_string(),
                disabled: self.form.is_disabled(),
                on_select: self.handlers.on_select,
            }
        }
    }

    /// Rendered only while the governing select holds its sentinel value.
    fn companion(&self, field: DemographicsField, label: &'static str) -> Element {
        if !self.form.answers().shows_companion(field) {
            return rsx! {};
        }
        rsx! {
            CompanionText {
                field,
                label,
                value: self.form.answers().text(field).to_string(),
                disabled: self.form.is_disabled(),
                on_input: self.handlers.on_text_input,
                on_blur: self.handlers.on_text_blur,
            }
        }
    }

    fn ethnicity(&self) -> Element {
        rsx! {
            EthnicityChecklist {
                choices: self.catalog.choices_for(DemographicsField::UserEthnicity).to_vec(),
                selected: self.form.answers().user_ethnicity.clone(),
                disabled: self.form.is_disabled(),
                on_toggle: self.handlers.on_toggle_ethnicity,
            }
        }
    }
}
