use std::sync::Arc;

use services::EnrollmentModel;
use support_core::model::{CourseMode, EnrollmentRecord};

/// Shared enrollment model usable as a component prop.
#[derive(Clone)]
pub struct EnrollmentHandle(pub Arc<EnrollmentModel>);

impl PartialEq for EnrollmentHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrollmentRowVm {
    pub course_id: String,
    pub mode: String,
    pub mode_name: String,
    pub is_active: bool,
    pub enrolled_by: Option<String>,
    pub reason: Option<String>,
    /// Modes the learner could move to; the current one is left out.
    pub other_modes: Vec<CourseMode>,
}

impl From<&EnrollmentRecord> for EnrollmentRowVm {
    fn from(record: &EnrollmentRecord) -> Self {
        let mode_name = record
            .course_modes
            .iter()
            .find(|mode| mode.slug == record.mode)
            .map_or_else(|| record.mode.clone(), |mode| mode.name.clone());
        Self {
            course_id: record.course_id.clone(),
            mode: record.mode.clone(),
            mode_name,
            is_active: record.is_active,
            enrolled_by: record.manual_enrollment.enrolled_by.clone(),
            reason: record.manual_enrollment.reason.clone(),
            other_modes: record
                .course_modes
                .iter()
                .filter(|mode| mode.slug != record.mode)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_mode_is_named_and_excluded_from_choices() {
        let record = EnrollmentRecord {
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
            ..EnrollmentRecord::new("course-v1:edX+DemoX+Demo", "audit")
        };
        let vm = EnrollmentRowVm::from(&record);
        assert_eq!(vm.mode_name, "Audit");
        assert_eq!(vm.other_modes.len(), 1);
        assert_eq!(vm.other_modes[0].slug, "verified");
        assert!(vm.enrolled_by.is_none());
    }
}
