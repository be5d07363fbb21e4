//! Forward-only page flow used by the demographics modal.
//!
//! Navigation lives in [`WizardState`]; this component only draws what the
//! state's [`WizardView`] asks for and forwards the footer actions.

use std::fmt;
use std::rc::Rc;

use dioxus::prelude::*;
use support_core::wizard::{PageKind, WizardLayout, WizardProgress, WizardState, WizardView};

/// Renders one wizard slot. Pages close over the owner's signals, so the
/// closure sees the current answers every time it runs.
#[derive(Clone)]
pub struct PageContent {
    render: Rc<dyn Fn(WizardProgress) -> Element>,
}

impl PageContent {
    pub fn new(render: impl Fn(WizardProgress) -> Element + 'static) -> Self {
        Self {
            render: Rc::new(render),
        }
    }

    fn render(&self, progress: WizardProgress) -> Element {
        (self.render)(progress)
    }
}

impl PartialEq for PageContent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for PageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContent").finish_non_exhaustive()
    }
}

#[component]
pub fn Wizard(
    pages: Vec<PageKind<PageContent>>,
    error: bool,
    on_dismiss: Callback<()>,
    on_wizard_complete: Callback<()>,
) -> Element {
    let layout = WizardLayout::from_children(pages);
    let mut state = use_signal(WizardState::new);

    let mut current = state();
    current.mount(&layout);
    let progress = current.progress();

    match current.view(&layout, error) {
        WizardView::Error { page } => rsx! {
            div { class: "wizard wizard-error",
                if let Some(page) = page {
                    div { class: "wizard-page", {page.render(progress)} }
                }
                div { class: "wizard-footer",
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| on_wizard_complete.call(()),
                        "Close"
                    }
                }
            }
        },
        WizardView::Active {
            header,
            page,
            show_next,
        } => rsx! {
            div { class: "wizard",
                if let Some((header, progress)) = header {
                    div { class: "wizard-header",
                        {header.render(progress)}
                        p { class: "wizard-progress",
                            "{progress.current_page} of {progress.total_pages}"
                        }
                    }
                }
                if let Some(page) = page {
                    div { class: "wizard-page", {page.render(progress)} }
                }
                div { class: "wizard-footer",
                    button {
                        class: "btn wizard-finish-later",
                        r#type: "button",
                        onclick: move |_| {
                            current.complete(|| on_dismiss.call(()), || on_wizard_complete.call(()));
                        },
                        "Finish later"
                    }
                    if show_next {
                        button {
                            class: "btn btn-primary wizard-next",
                            r#type: "button",
                            onclick: move |_| {
                                let mut next = current;
                                next.advance();
                                state.set(next);
                            },
                            "Next"
                        }
                    }
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_harness::drive_dom;
    use dioxus::core::NoOpMutations;

    fn text_page(text: &'static str) -> PageContent {
        PageContent::new(move |_| rsx! { p { "{text}" } })
    }

    fn pages() -> Vec<PageKind<PageContent>> {
        vec![
            PageKind::Header(PageContent::new(|progress| {
                rsx! { h2 { "Header for page {progress.current_page}" } }
            })),
            PageKind::Page(text_page("First question")),
            PageKind::Closer(text_page("Thank you")),
            PageKind::Page(text_page("Second question")),
            PageKind::ErrorPage(text_page("Could not load")),
        ]
    }

    #[component]
    fn Host(error: bool) -> Element {
        rsx! {
            Wizard {
                pages: pages(),
                error,
                on_dismiss: move |()| {},
                on_wizard_complete: move |()| {},
            }
        }
    }

    fn render(error: bool) -> String {
        let mut dom = VirtualDom::new_with_props(Host, HostProps { error });
        dom.rebuild(&mut NoOpMutations);
        drive_dom(&mut dom);
        dioxus_ssr::render(&dom)
    }

    #[test]
    fn first_render_shows_header_first_page_and_both_actions() {
        let html = render(false);
        assert!(html.contains("Header for page 1"), "missing header in {html}");
        assert!(html.contains("1 of 2"), "missing progress in {html}");
        assert!(html.contains("First question"), "missing page in {html}");
        assert!(!html.contains("Second question"), "second page leaked in {html}");
        assert!(html.contains("Finish later"), "missing finish later in {html}");
        assert!(html.contains("Next"), "missing next in {html}");
    }

    #[test]
    fn error_flag_renders_only_the_error_page() {
        let html = render(true);
        assert!(html.contains("Could not load"), "missing error page in {html}");
        assert!(html.contains("Close"), "missing close in {html}");
        assert!(!html.contains("Header for page"), "header leaked in {html}");
        assert!(!html.contains("First question"), "page leaked in {html}");
        assert!(!html.contains("Next"), "next leaked in {html}");
    }
}
