use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use services::{DemographicsService, EnrollmentService, InspectorService};
use support_core::model::UserId;

pub trait UiApp: Send + Sync {
    /// Learner whose demographics the modal edits; `None` when signed out.
    fn user_id(&self) -> Option<UserId>;
    /// Learner whose enrollments the support page opens with.
    fn username(&self) -> Option<String>;
    fn open_demographics_on_launch(&self) -> bool;

    fn demographics(&self) -> Arc<DemographicsService>;
    fn enrollments(&self) -> Arc<EnrollmentService>;
    fn inspector(&self) -> Arc<InspectorService>;
}

#[derive(Clone)]
pub struct AppContext {
    user_id: Option<UserId>,
    username: Option<String>,
    open_demographics_on_launch_once: Arc<AtomicBool>,

    demographics: Arc<DemographicsService>,
    enrollments: Arc<EnrollmentService>,
    inspector: Arc<InspectorService>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            user_id: app.user_id(),
            username: app.username(),
            open_demographics_on_launch_once: Arc::new(AtomicBool::new(
                app.open_demographics_on_launch(),
            )),
            demographics: app.demographics(),
            enrollments: app.enrollments(),
            inspector: app.inspector(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.username.clone()
    }

    /// True exactly once per launch when the modal should open by itself.
    #[must_use]
    pub fn take_open_demographics_on_launch(&self) -> bool {
        self.open_demographics_on_launch_once
            .swap(false, Ordering::AcqRel)
    }

    #[must_use]
    pub fn demographics(&self) -> Arc<DemographicsService> {
        Arc::clone(&self.demographics)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn inspector(&self) -> Arc<InspectorService> {
        Arc::clone(&self.inspector)
    }
}

// Provided by the composition root in `crates/app`.

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
