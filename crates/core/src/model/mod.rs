pub mod choices;
pub mod demographics;
pub mod enrollment;
mod ids;
pub mod inspector;

pub use choices::{Choice, ETHNICITY_CHOICES_PATH, FieldChoiceCatalog};
pub use demographics::{
    DECLINED, DEFAULT_OPTION, DemographicsAnswers, DemographicsError, DemographicsField,
    DemographicsForm, DemographicsRecord, EthnicityEntry, FieldPatch, FieldValue, OTHER,
    SELF_DESCRIBE, apply_ethnicity_change,
};
pub use enrollment::{
    CourseMode, EnrollmentChange, EnrollmentConfirmation, EnrollmentCreated, EnrollmentError,
    EnrollmentRecord, EnrollmentSnapshot, ManualEnrollment, NewEnrollment,
};
pub use ids::{ParseUserIdError, UserId};
pub use inspector::{
    CourseEnrollment, IdVerification, InspectorQuery, InspectorQueryError, LearnerInfo,
    ProgramCourseEnrollment, ProgramEnrollment, SsoRecord, UserAccount,
};
