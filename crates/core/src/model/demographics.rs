use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::model::ids::UserId;

/// Placeholder option value meaning "nothing selected". Saved as `null`.
pub const DEFAULT_OPTION: &str = "default";
/// Gender value that reveals the free-text `gender_description` input.
pub const SELF_DESCRIBE: &str = "self-describe";
/// Work-status value that reveals the free-text `work_status_description` input.
pub const OTHER: &str = "other";
/// Ethnicity value that excludes every other ethnicity selection.
pub const DECLINED: &str = "declined";

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DemographicsError {
    #[error("unknown demographics field: {0}")]
    UnknownField(String),
    #[error("field {field} expects a {expected} value")]
    ShapeMismatch {
        field: DemographicsField,
        expected: &'static str,
    },
}

//
// ─── FIELDS ───────────────────────────────────────────────────────────────────
//

/// Every answer the demographics record stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemographicsField {
    Gender,
    GenderDescription,
    UserEthnicity,
    Income,
    LearnerEducationLevel,
    ParentEducationLevel,
    MilitaryHistory,
    WorkStatus,
    WorkStatusDescription,
    CurrentWorkSector,
    FutureWorkSector,
}

impl DemographicsField {
    pub const ALL: [DemographicsField; 11] = [
        DemographicsField::Gender,
        DemographicsField::GenderDescription,
        DemographicsField::UserEthnicity,
        DemographicsField::Income,
        DemographicsField::LearnerEducationLevel,
        DemographicsField::ParentEducationLevel,
        DemographicsField::MilitaryHistory,
        DemographicsField::WorkStatus,
        DemographicsField::WorkStatusDescription,
        DemographicsField::CurrentWorkSector,
        DemographicsField::FutureWorkSector,
    ];

    /// Name used by the REST resource.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DemographicsField::Gender => "gender",
            DemographicsField::GenderDescription => "gender_description",
            DemographicsField::UserEthnicity => "user_ethnicity",
            DemographicsField::Income => "income",
            DemographicsField::LearnerEducationLevel => "learner_education_level",
            DemographicsField::ParentEducationLevel => "parent_education_level",
            DemographicsField::MilitaryHistory => "military_history",
            DemographicsField::WorkStatus => "work_status",
            DemographicsField::WorkStatusDescription => "work_status_description",
            DemographicsField::CurrentWorkSector => "current_work_sector",
            DemographicsField::FutureWorkSector => "future_work_sector",
        }
    }

    #[must_use]
    pub fn is_multi_valued(self) -> bool {
        matches!(self, DemographicsField::UserEthnicity)
    }

    /// The select field whose value decides whether this free-text field is shown,
    /// together with the value that reveals it.
    #[must_use]
    pub fn governed_by(self) -> Option<(DemographicsField, &'static str)> {
        match self {
            DemographicsField::GenderDescription => Some((DemographicsField::Gender, SELF_DESCRIBE)),
            DemographicsField::WorkStatusDescription => {
                Some((DemographicsField::WorkStatus, OTHER))
            }
            _ => None,
        }
    }
}

impl fmt::Display for DemographicsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemographicsField {
    type Err = DemographicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DemographicsField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| DemographicsError::UnknownField(s.to_string()))
    }
}

/// A single answer as the form holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values),
            FieldValue::Text(_) => None,
        }
    }
}

//
// ─── WIRE SHAPE ───────────────────────────────────────────────────────────────
//

/// One element of the API's ethnicity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthnicityEntry {
    pub ethnicity: String,
}

/// A demographics record as the REST resource serializes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicsRecord {
    pub user: Option<UserId>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub gender_description: Option<String>,
    #[serde(default)]
    pub user_ethnicity: Vec<EthnicityEntry>,
    #[serde(default)]
    pub income: Option<String>,
    #[serde(default)]
    pub learner_education_level: Option<String>,
    #[serde(default)]
    pub parent_education_level: Option<String>,
    #[serde(default)]
    pub military_history: Option<String>,
    #[serde(default)]
    pub work_status: Option<String>,
    #[serde(default)]
    pub work_status_description: Option<String>,
    #[serde(default)]
    pub current_work_sector: Option<String>,
    #[serde(default)]
    pub future_work_sector: Option<String>,
}

impl DemographicsRecord {
    /// An unanswered record for `user`, as created on first access.
    #[must_use]
    pub fn empty_for(user: UserId) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }

    /// Apply a `{field: value}` patch body the way the server would.
    ///
    /// # Errors
    ///
    /// Returns `DemographicsError` when the body names an unknown field or carries
    /// a value of the wrong shape.
    pub fn apply_patch(&mut self, body: &Value) -> Result<(), DemographicsError> {
        let Some(map) = body.as_object() else {
            return Ok(());
        };
        for (key, value) in map {
            let field: DemographicsField = key.parse()?;
            if field.is_multi_valued() {
                let entries: Vec<EthnicityEntry> = match value {
                    Value::Null => Vec::new(),
                    other => serde_json::from_value(other.clone()).map_err(|_| {
                        DemographicsError::ShapeMismatch {
                            field,
                            expected: "list",
                        }
                    })?,
                };
                self.user_ethnicity = entries;
                continue;
            }
            let text = match value {
                Value::Null => None,
                Value::String(text) => Some(text.clone()),
                _ => {
                    return Err(DemographicsError::ShapeMismatch {
                        field,
                        expected: "string",
                    });
                }
            };
            if let Some(slot) = self.single_slot(field) {
                *slot = text;
            }
        }
        Ok(())
    }

    fn single_slot(&mut self, field: DemographicsField) -> Option<&mut Option<String>> {
        let slot = match field {
            DemographicsField::Gender => &mut self.gender,
            DemographicsField::GenderDescription => &mut self.gender_description,
            DemographicsField::Income => &mut self.income,
            DemographicsField::LearnerEducationLevel => &mut self.learner_education_level,
            DemographicsField::ParentEducationLevel => &mut self.parent_education_level,
            DemographicsField::MilitaryHistory => &mut self.military_history,
            DemographicsField::WorkStatus => &mut self.work_status,
            DemographicsField::WorkStatusDescription => &mut self.work_status_description,
            DemographicsField::CurrentWorkSector => &mut self.current_work_sector,
            DemographicsField::FutureWorkSector => &mut self.future_work_sector,
            DemographicsField::UserEthnicity => return None,
        };
        Some(slot)
    }
}

/// Flatten `[{ethnicity: "x"}, ...]` into `["x", ...]`, keeping order.
#[must_use]
pub fn ethnicity_from_wire(entries: &[EthnicityEntry]) -> Vec<String> {
    entries.iter().map(|entry| entry.ethnicity.clone()).collect()
}

/// Inverse of [`ethnicity_from_wire`].
#[must_use]
pub fn ethnicity_to_wire(values: &[String]) -> Vec<EthnicityEntry> {
    values
        .iter()
        .map(|value| EthnicityEntry {
            ethnicity: value.clone(),
        })
        .collect()
}

//
// ─── UI SHAPE ─────────────────────────────────────────────────────────────────
//

/// Answers in the shape the form edits: unset text is `""`, unset lists are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicsAnswers {
    pub gender: String,
    pub gender_description: String,
    pub user_ethnicity: Vec<String>,
    pub income: String,
    pub learner_education_level: String,
    pub parent_education_level: String,
    pub military_history: String,
    pub work_status: String,
    pub work_status_description: String,
    pub current_work_sector: String,
    pub future_work_sector: String,
}

impl DemographicsAnswers {
    #[must_use]
    pub fn from_record(record: &DemographicsRecord) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            gender: text(&record.gender),
            gender_description: text(&record.gender_description),
            user_ethnicity: ethnicity_from_wire(&record.user_ethnicity),
            income: text(&record.income),
            learner_education_level: text(&record.learner_education_level),
            parent_education_level: text(&record.parent_education_level),
            military_history: text(&record.military_history),
            work_status: text(&record.work_status),
            work_status_description: text(&record.work_status_description),
            current_work_sector: text(&record.current_work_sector),
            future_work_sector: text(&record.future_work_sector),
        }
    }

    #[must_use]
    pub fn get(&self, field: DemographicsField) -> FieldValue {
        match field {
            DemographicsField::UserEthnicity => FieldValue::List(self.user_ethnicity.clone()),
            other => FieldValue::Text(self.text(other).to_string()),
        }
    }

    /// Text value of a single-valued field; empty for the ethnicity list.
    #[must_use]
    pub fn text(&self, field: DemographicsField) -> &str {
        match field {
            DemographicsField::Gender => &self.gender,
            DemographicsField::GenderDescription => &self.gender_description,
            DemographicsField::Income => &self.income,
            DemographicsField::LearnerEducationLevel => &self.learner_education_level,
            DemographicsField::ParentEducationLevel => &self.parent_education_level,
            DemographicsField::MilitaryHistory => &self.military_history,
            DemographicsField::WorkStatus => &self.work_status,
            DemographicsField::WorkStatusDescription => &self.work_status_description,
            DemographicsField::CurrentWorkSector => &self.current_work_sector,
            DemographicsField::FutureWorkSector => &self.future_work_sector,
            DemographicsField::UserEthnicity => "",
        }
    }

    /// # Errors
    ///
    /// Returns `DemographicsError::ShapeMismatch` when a list is assigned to a text
    /// field or the other way round.
    pub fn set(&mut self, field: DemographicsField, value: FieldValue) -> Result<(), DemographicsError> {
        match (field, value) {
            (DemographicsField::UserEthnicity, FieldValue::List(values)) => {
                self.user_ethnicity = values;
            }
            (DemographicsField::UserEthnicity, FieldValue::Text(_)) => {
                return Err(DemographicsError::ShapeMismatch {
                    field,
                    expected: "list",
                });
            }
            (_, FieldValue::List(_)) => {
                return Err(DemographicsError::ShapeMismatch {
                    field,
                    expected: "string",
                });
            }
            (other, FieldValue::Text(text)) => {
                if let Some(slot) = self.text_slot(other) {
                    *slot = text;
                }
            }
        }
        Ok(())
    }

    fn text_slot(&mut self, field: DemographicsField) -> Option<&mut String> {
        let slot = match field {
            DemographicsField::Gender => &mut self.gender,
            DemographicsField::GenderDescription => &mut self.gender_description,
            DemographicsField::Income => &mut self.income,
            DemographicsField::LearnerEducationLevel => &mut self.learner_education_level,
            DemographicsField::ParentEducationLevel => &mut self.parent_education_level,
            DemographicsField::MilitaryHistory => &mut self.military_history,
            DemographicsField::WorkStatus => &mut self.work_status,
            DemographicsField::WorkStatusDescription => &mut self.work_status_description,
            DemographicsField::CurrentWorkSector => &mut self.current_work_sector,
            DemographicsField::FutureWorkSector => &mut self.future_work_sector,
            DemographicsField::UserEthnicity => return None,
        };
        Some(slot)
    }

    /// Whether a free-text companion field should be visible.
    ///
    /// Fields without a governing select are always shown.
    #[must_use]
    pub fn shows_companion(&self, field: DemographicsField) -> bool {
        match field.governed_by() {
            Some((select, sentinel)) => self.text(select) == sentinel,
            None => true,
        }
    }
}

//
// ─── PATCH BODIES ─────────────────────────────────────────────────────────────
//

/// A single-field update, `{field: value}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPatch {
    field: DemographicsField,
    value: FieldValue,
}

impl FieldPatch {
    #[must_use]
    pub fn new(field: DemographicsField, value: FieldValue) -> Self {
        Self { field, value }
    }

    #[must_use]
    pub fn field(&self) -> DemographicsField {
        self.field
    }

    #[must_use]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// JSON body for the PATCH request.
    ///
    /// The `"default"` placeholder becomes `null`; ethnicity goes out as
    /// `[{ethnicity: ...}]`.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let wire = match &self.value {
            FieldValue::Text(text) if text == DEFAULT_OPTION => Value::Null,
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::List(values) => json!(ethnicity_to_wire(values)),
        };
        let mut body = Map::new();
        body.insert(self.field.as_str().to_string(), wire);
        Value::Object(body)
    }
}

//
// ─── ETHNICITY SELECTION ──────────────────────────────────────────────────────
//

/// Apply one checkbox change to the ethnicity selection.
///
/// Checking `declined` leaves exactly `["declined"]`. Checking anything else drops
/// `declined`. Unchecking removes the value. Order of first selection is kept.
#[must_use]
pub fn apply_ethnicity_change(current: &[String], value: &str, checked: bool) -> Vec<String> {
    if !checked {
        return current
            .iter()
            .filter(|selected| selected.as_str() != value)
            .cloned()
            .collect();
    }
    if value == DECLINED {
        return vec![DECLINED.to_string()];
    }
    let mut next: Vec<String> = current
        .iter()
        .filter(|selected| selected.as_str() != DECLINED)
        .cloned()
        .collect();
    if !next.iter().any(|selected| selected == value) {
        next.push(value.to_string());
    }
    next
}

//
// ─── FORM STATE ───────────────────────────────────────────────────────────────
//

/// The modal's answer state plus the field-level error flag.
///
/// A failed save freezes the form: values stay visible, edits are refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicsForm {
    answers: DemographicsAnswers,
    field_error: bool,
}

impl DemographicsForm {
    #[must_use]
    pub fn new(answers: DemographicsAnswers) -> Self {
        Self {
            answers,
            field_error: false,
        }
    }

    #[must_use]
    pub fn answers(&self) -> &DemographicsAnswers {
        &self.answers
    }

    #[must_use]
    pub fn field_error(&self) -> bool {
        self.field_error
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.field_error
    }

    /// Optimistically store `value` and return the patch that persists it.
    ///
    /// Returns `None` once the form is frozen.
    ///
    /// # Errors
    ///
    /// Returns `DemographicsError::ShapeMismatch` for a value of the wrong shape.
    pub fn change(
        &mut self,
        field: DemographicsField,
        value: FieldValue,
    ) -> Result<Option<FieldPatch>, DemographicsError> {
        if self.field_error {
            return Ok(None);
        }
        self.answers.set(field, value.clone())?;
        Ok(Some(FieldPatch::new(field, value)))
    }

    /// Toggle one ethnicity checkbox and return the patch for the resulting list.
    #[must_use]
    pub fn toggle_ethnicity(&mut self, value: &str, checked: bool) -> Option<FieldPatch> {
        if self.field_error {
            return None;
        }
        let next = apply_ethnicity_change(&self.answers.user_ethnicity, value, checked);
        self.answers.user_ethnicity = next.clone();
        Some(FieldPatch::new(
            DemographicsField::UserEthnicity,
            FieldValue::List(next),
        ))
    }

    /// Track typing in a free-text field without saving it.
    ///
    /// # Errors
    ///
    /// Returns `DemographicsError::ShapeMismatch` for a value of the wrong shape.
    pub fn set_local(
        &mut self,
        field: DemographicsField,
        value: FieldValue,
    ) -> Result<(), DemographicsError> {
        if self.field_error {
            return Ok(());
        }
        self.answers.set(field, value)
    }

    /// Patch carrying the current value of `field`, used when a text input blurs.
    #[must_use]
    pub fn patch_for_current(&self, field: DemographicsField) -> Option<FieldPatch> {
        if self.field_error {
            return None;
        }
        Some(FieldPatch::new(field, self.answers.get(field)))
    }

    pub fn record_field_error(&mut self) {
        self.field_error = true;
    }
}
