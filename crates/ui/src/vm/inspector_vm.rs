use services::InspectorResult;
use support_core::model::{
    IdVerification, LearnerInfo, ProgramCourseEnrollment, ProgramEnrollment, UserAccount,
};

use crate::vm::time_fmt::format_timestamp;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountVm {
    pub username: String,
    pub email: String,
    pub external_user_key: Option<String>,
    /// `None` renders the "no Single Sign On record" notice.
    pub sso_uids: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationVm {
    pub status: String,
    pub error: Option<String>,
    pub expires: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedEnrollmentVm {
    pub course_id: String,
    pub is_active: String,
    pub mode: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramCourseVm {
    pub course_key: String,
    pub course_url: Option<String>,
    pub status: String,
    pub created: String,
    pub modified: String,
    pub linked: Option<LinkedEnrollmentVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramEnrollmentVm {
    pub program_uuid: String,
    pub program_name: String,
    pub status: String,
    pub created: String,
    pub modified: String,
    pub external_user_key: String,
    pub courses: Vec<ProgramCourseVm>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InspectorResultVm {
    pub has_results: bool,
    pub account: Option<AccountVm>,
    pub verification: Option<VerificationVm>,
    pub enrollments: Option<Vec<ProgramEnrollmentVm>>,
    pub error: Option<String>,
    pub org_keys: Vec<String>,
}

impl From<&UserAccount> for AccountVm {
    fn from(user: &UserAccount) -> Self {
        Self {
            username: user.username.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            external_user_key: user
                .external_user_key
                .clone()
                .filter(|key| !key.is_empty()),
            sso_uids: user
                .sso_list
                .as_ref()
                .map(|records| records.iter().map(|sso| sso.uid.clone()).collect()),
        }
    }
}

impl From<&IdVerification> for VerificationVm {
    fn from(verification: &IdVerification) -> Self {
        Self {
            status: verification.status.clone(),
            error: verification.error.clone().filter(|err| !err.is_empty()),
            expires: verification
                .verification_expiry
                .as_deref()
                .filter(|expiry| !expiry.is_empty())
                .map(format_timestamp),
        }
    }
}

impl From<&ProgramCourseEnrollment> for ProgramCourseVm {
    fn from(course: &ProgramCourseEnrollment) -> Self {
        Self {
            course_key: course.course_key.clone(),
            course_url: course.course_url.clone(),
            status: course.status.clone(),
            created: format_timestamp(&course.created),
            modified: format_timestamp(&course.modified),
            linked: course
                .course_enrollment
                .as_ref()
                .map(|linked| LinkedEnrollmentVm {
                    course_id: linked.course_id.clone(),
                    is_active: linked.is_active.to_string(),
                    mode: linked.mode.clone(),
                }),
        }
    }
}

impl From<&ProgramEnrollment> for ProgramEnrollmentVm {
    fn from(enrollment: &ProgramEnrollment) -> Self {
        Self {
            program_uuid: enrollment.program_uuid.to_string(),
            program_name: enrollment.program_name.clone().unwrap_or_default(),
            status: enrollment.status.clone(),
            created: format_timestamp(&enrollment.created),
            modified: format_timestamp(&enrollment.modified),
            external_user_key: enrollment.external_user_key.clone().unwrap_or_default(),
            courses: enrollment
                .program_course_enrollments
                .iter()
                .map(ProgramCourseVm::from)
                .collect(),
        }
    }
}

#[must_use]
pub fn map_learner_info(info: &LearnerInfo) -> InspectorResultVm {
    InspectorResultVm {
        has_results: !info.is_empty(),
        account: info.user.as_ref().map(AccountVm::from),
        verification: info.id_verification.as_ref().map(VerificationVm::from),
        enrollments: info
            .enrollments
            .as_ref()
            .map(|items| items.iter().map(ProgramEnrollmentVm::from).collect()),
        error: None,
        org_keys: Vec::new(),
    }
}

#[must_use]
pub fn map_inspector_result(result: &InspectorResult) -> InspectorResultVm {
    InspectorResultVm {
        error: result.error.clone(),
        org_keys: result.org_keys.clone(),
        ..map_learner_info(&result.learner_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_core::model::{CourseEnrollment, SsoRecord};
    use uuid::Uuid;

    fn result() -> InspectorResult {
        InspectorResult {
            learner_info: LearnerInfo {
                user: Some(UserAccount {
                    username: Some("learner".into()),
                    email: Some("learner@example.com".into()),
                    external_user_key: Some("AbCdEf123".into()),
                    sso_list: Some(vec![SsoRecord {
                        uid: "test_org:AbCdEf123".into(),
                    }]),
                }),
                id_verification: None,
                enrollments: Some(vec![ProgramEnrollment {
                    program_uuid: Uuid::nil(),
                    program_name: Some("Analytics".into()),
                    status: "enrolled".into(),
                    created: "2020-01-01T00:00:00Z".into(),
                    modified: "2020-02-01T00:00:00Z".into(),
                    external_user_key: Some("AbCdEf123".into()),
                    program_course_enrollments: vec![ProgramCourseEnrollment {
                        course_key: "course-v1:edX+DemoX+Demo".into(),
                        course_url: None,
                        status: "active".into(),
                        created: "2020-01-01T00:00:00Z".into(),
                        modified: "2020-01-01T00:00:00Z".into(),
                        course_enrollment: Some(CourseEnrollment {
                            course_id: "course-v1:edX+DemoX+Demo".into(),
                            is_active: true,
                            mode: "masters".into(),
                        }),
                    }],
                }]),
            },
            org_keys: vec!["test_org".into()],
            error: None,
        }
    }

    #[test]
    fn maps_nested_enrollments() {
        let vm = map_inspector_result(&result());
        assert!(vm.has_results);
        assert_eq!(vm.org_keys, vec!["test_org".to_string()]);
        let enrollments = vm.enrollments.unwrap();
        assert_eq!(enrollments[0].created, "2020-01-01 00:00 UTC");
        let linked = enrollments[0].courses[0].linked.clone().unwrap();
        assert_eq!(linked.is_active, "true");
        assert_eq!(linked.mode, "masters");
        assert_eq!(
            vm.account.unwrap().sso_uids,
            Some(vec!["test_org:AbCdEf123".to_string()])
        );
    }

    #[test]
    fn empty_result_has_no_sections() {
        let vm = map_inspector_result(&InspectorResult::default());
        assert!(!vm.has_results);
        assert!(vm.account.is_none());
        assert!(vm.enrollments.is_none());
    }
}
