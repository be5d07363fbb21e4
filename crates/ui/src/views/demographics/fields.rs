use dioxus::prelude::*;
use support_core::model::{Choice, DEFAULT_OPTION, DemographicsField};

#[component]
pub fn SelectField(
    field: DemographicsField,
    label: &'static str,
    choices: Vec<Choice>,
    value: String,
    disabled: bool,
    on_select: Callback<(DemographicsField, String)>,
) -> Element {
    let id = field.as_str();
    let selected = if value.is_empty() {
        DEFAULT_OPTION.to_string()
    } else {
        value
    };

    rsx! {
        div { class: "demographics-field",
            label { r#for: "{id}", "{label}" }
            select {
                id: "{id}",
                name: "{id}",
                class: "demographics-select",
                disabled,
                value: "{selected}",
                onchange: move |evt| on_select.call((field, evt.value())),
                option {
                    value: DEFAULT_OPTION,
                    selected: selected == DEFAULT_OPTION,
                    "Select an option"
                }
                for choice in choices {
                    option {
                        key: "{choice.value}",
                        value: "{choice.value}",
                        selected: choice.value == selected,
                        "{choice.display_name}"
                    }
                }
            }
        }
    }
}

/// Free-text input saved when it loses focus.
#[component]
pub fn CompanionText(
    field: DemographicsField,
    label: &'static str,
    value: String,
    disabled: bool,
    on_input: Callback<(DemographicsField, String)>,
    on_blur: Callback<DemographicsField>,
) -> Element {
    let id = field.as_str();

    rsx! {
        div { class: "demographics-field demographics-companion",
            label { r#for: "{id}", "{label}" }
            input {
                id: "{id}",
                name: "{id}",
                r#type: "text",
                class: "demographics-text",
                disabled,
                value: "{value}",
                oninput: move |evt| on_input.call((field, evt.value())),
                onblur: move |_| on_blur.call(field),
            }
        }
    }
}

#[component]
pub fn EthnicityChecklist(
    choices: Vec<Choice>,
    selected: Vec<String>,
    disabled: bool,
    on_toggle: Callback<(String, bool)>,
) -> Element {
    rsx! {
        fieldset { class: "demographics-field demographics-checklist",
            legend { "What is your race or ethnicity? Select all that apply." }
            for choice in choices {
                {
                    let checked = selected.contains(&choice.value);
                    let id = format!("ethnicity-{}", choice.value);
                    let value = choice.value.clone();
                    rsx! {
                        div { key: "{choice.value}", class: "demographics-checkbox",
                            input {
                                id: "{id}",
                                r#type: "checkbox",
                                name: "ethnicity",
                                value: "{choice.value}",
                                checked,
                                disabled,
                                onchange: move |evt| on_toggle.call((value.clone(), evt.checked())),
                            }
                            label { r#for: "{id}", "{choice.display_name}" }
                        }
                    }
                }
            }
        }
    }
}
