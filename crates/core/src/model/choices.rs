use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::demographics::DemographicsField;

/// Catalog key for the choices nested inside the ethnicity list serializer.
pub const ETHNICITY_CHOICES_PATH: &str = "user_ethnicity.child.children.ethnicity";

/// One selectable option for a demographics field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub display_name: String,
}

impl Choice {
    #[must_use]
    pub fn new(value: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display_name: display_name.into(),
        }
    }
}

/// Valid options per field, as advertised by the collection endpoint's OPTIONS response.
///
/// Keys are field names, or dotted paths for choices that live inside a nested
/// list serializer (see [`ETHNICITY_CHOICES_PATH`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChoiceCatalog {
    choices: BTreeMap<String, Vec<Choice>>,
}

impl FieldChoiceCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `{actions: {POST: {<field>: {choices: [...]}, ...}}}`.
    ///
    /// Nested serializers are walked through their `child` and `children` keys,
    /// producing dotted keys. A response without `actions.POST` yields an empty
    /// catalog.
    #[must_use]
    pub fn from_options_response(body: &Value) -> Self {
        let mut catalog = Self::new();
        if let Some(fields) = body
            .get("actions")
            .and_then(|actions| actions.get("POST"))
            .and_then(Value::as_object)
        {
            for (name, spec) in fields {
                catalog.collect(name, spec);
            }
        }
        catalog
    }

    fn collect(&mut self, path: &str, spec: &Value) {
        if let Some(raw) = spec.get("choices").and_then(Value::as_array) {
            let parsed = raw
                .iter()
                .filter_map(|choice| serde_json::from_value::<Choice>(choice.clone()).ok())
                .collect();
            self.choices.insert(path.to_string(), parsed);
        }
        if let Some(child) = spec.get("child") {
            self.collect(&format!("{path}.child"), child);
        }
        if let Some(children) = spec.get("children").and_then(Value::as_object) {
            for (name, nested) in children {
                self.collect(&format!("{path}.children.{name}"), nested);
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, choices: Vec<Choice>) {
        self.choices.insert(key.into(), choices);
    }

    /// Choices stored under an exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> &[Choice] {
        self.choices.get(key).map_or(&[], Vec::as_slice)
    }

    /// Choices for a form field; ethnicity resolves through its nested path.
    #[must_use]
    pub fn choices_for(&self, field: DemographicsField) -> &[Choice] {
        match field {
            DemographicsField::UserEthnicity => self.get(ETHNICITY_CHOICES_PATH),
            other => self.get(other.as_str()),
        }
    }

    #[must_use]
    pub fn display_name(&self, field: DemographicsField, value: &str) -> Option<&str> {
        self.choices_for(field)
            .iter()
            .find(|choice| choice.value == value)
            .map(|choice| choice.display_name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options_body() -> Value {
        json!({
            "name": "Demographics List",
            "actions": {
                "POST": {
                    "user": {"type": "field", "required": true},
                    "gender": {
                        "type": "choice",
                        "choices": [
                            {"value": "woman", "display_name": "Woman"},
                            {"value": "self-describe", "display_name": "Prefer to self-describe"}
                        ]
                    },
                    "user_ethnicity": {
                        "type": "field",
                        "child": {
                            "type": "nested object",
                            "children": {
                                "ethnicity": {
                                    "type": "choice",
                                    "choices": [
                                        {"value": "asian", "display_name": "Asian"},
                                        {"value": "declined", "display_name": "Prefer not to respond"}
                                    ]
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn parses_flat_and_nested_choices() {
        let catalog = FieldChoiceCatalog::from_options_response(&options_body());
        let gender = catalog.choices_for(DemographicsField::Gender);
        assert_eq!(gender.len(), 2);
        assert_eq!(gender[0], Choice::new("woman", "Woman"));

        let ethnicity = catalog.choices_for(DemographicsField::UserEthnicity);
        assert_eq!(ethnicity.len(), 2);
        assert_eq!(catalog.get(ETHNICITY_CHOICES_PATH), ethnicity);
        assert_eq!(
            catalog.display_name(DemographicsField::UserEthnicity, "declined"),
            Some("Prefer not to respond")
        );
    }

    #[test]
    fn missing_fields_have_no_choices() {
        let catalog = FieldChoiceCatalog::from_options_response(&options_body());
        assert!(catalog.choices_for(DemographicsField::Income).is_empty());
        assert!(catalog.get("user").is_empty());
    }

    #[test]
    fn response_without_actions_is_empty() {
        let catalog = FieldChoiceCatalog::from_options_response(&json!({"detail": "nope"}));
        assert!(catalog.is_empty());
    }
}
