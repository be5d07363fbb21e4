mod demographics;
mod enrollments;
mod inspector;
mod prompt;
mod state;
pub mod wizard;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use demographics::DemographicsCollectionModal;
pub use enrollments::EnrollmentSupportView;
pub use inspector::ProgramEnrollmentsInspectorPage;
pub use prompt::DemographicsPromptView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use wizard::{PageContent, Wizard};
