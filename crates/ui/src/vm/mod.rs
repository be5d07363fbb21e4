mod enrollment_vm;
mod inspector_vm;
mod time_fmt;

pub use enrollment_vm::{EnrollmentHandle, EnrollmentRowVm};
pub use inspector_vm::{
    AccountVm, InspectorResultVm, LinkedEnrollmentVm, ProgramCourseVm, ProgramEnrollmentVm,
    VerificationVm, map_inspector_result, map_learner_info,
};
pub use time_fmt::format_timestamp;
