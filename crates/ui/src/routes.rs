use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::views::{DemographicsPromptView, EnrollmentSupportView, ProgramEnrollmentsInspectorPage};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", DemographicsPromptView)] Home {},
        #[route("/inspector", ProgramEnrollmentsInspectorPage)] Inspector {},
        #[route("/enrollments", EnrollmentSupportView)] Enrollments {},
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    rsx! {
        nav { class: "sidebar",
            h1 { "Learner Support" }
            ul {
                li { Link { to: Route::Home {}, "Dashboard" } }
                li { Link { to: Route::Inspector {}, "Program enrollments" } }
                li { Link { to: Route::Enrollments {}, "Enrollments" } }
            }
        }
    }
}
