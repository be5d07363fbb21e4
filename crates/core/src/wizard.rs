//! Forward-only navigation for multi-page forms.
//!
//! The owner declares its pages as a flat list of [`PageKind`]s. Mounting
//! partitions that list into a [`WizardLayout`]; a [`WizardState`] then tracks the
//! position and decides what is visible. Page payloads are opaque here, so the
//! UI can hand in render functions and tests can hand in strings.

/// A declared wizard child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind<T> {
    Header(T),
    Page(T),
    Closer(T),
    ErrorPage(T),
}

/// Pages grouped by role. The closer, when declared, always sits after the
/// content pages regardless of where it appeared in the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardLayout<T> {
    header: Option<T>,
    pages: Vec<T>,
    content_pages: usize,
    has_closer: bool,
    error_page: Option<T>,
}

impl<T> WizardLayout<T> {
    /// Partition declared children. Only the first header, closer and error page
    /// are kept.
    #[must_use]
    pub fn from_children(children: impl IntoIterator<Item = PageKind<T>>) -> Self {
        let mut header = None;
        let mut pages = Vec::new();
        let mut closer = None;
        let mut error_page = None;
        for child in children {
            match child {
                PageKind::Header(value) => {
                    header.get_or_insert(value);
                }
                PageKind::Page(value) => pages.push(value),
                PageKind::Closer(value) => {
                    closer.get_or_insert(value);
                }
                PageKind::ErrorPage(value) => {
                    error_page.get_or_insert(value);
                }
            }
        }
        let content_pages = pages.len();
        let has_closer = closer.is_some();
        pages.extend(closer);
        Self {
            header,
            pages,
            content_pages,
            has_closer,
            error_page,
        }
    }

    /// Content pages plus the closer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn content_pages(&self) -> usize {
        self.content_pages
    }

    #[must_use]
    pub fn has_closer(&self) -> bool {
        self.has_closer
    }

    /// Page at a 1-based position.
    #[must_use]
    pub fn page(&self, position: usize) -> Option<&T> {
        position.checked_sub(1).and_then(|index| self.pages.get(index))
    }

    #[must_use]
    pub fn header(&self) -> Option<&T> {
        self.header.as_ref()
    }

    #[must_use]
    pub fn error_page(&self) -> Option<&T> {
        self.error_page.as_ref()
    }
}

/// Position shown by the header, e.g. "2 of 6".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardProgress {
    pub current_page: usize,
    pub total_pages: usize,
}

/// What the wizard should draw for the current state.
#[derive(Debug, PartialEq, Eq)]
pub enum WizardView<'a, T> {
    /// Only the error page and a single close action.
    Error { page: Option<&'a T> },
    Active {
        /// Present on content pages; the closer renders without a header.
        header: Option<(&'a T, WizardProgress)>,
        page: Option<&'a T>,
        show_next: bool,
    },
}

/// Navigation counters. Holds no page data and no persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardState {
    current_page: usize,
    total_pages: usize,
    page_count: usize,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            page_count: 0,
        }
    }

    /// Build a state already mounted on `layout`.
    #[must_use]
    pub fn mounted<T>(layout: &WizardLayout<T>) -> Self {
        let mut state = Self::new();
        state.mount(layout);
        state
    }

    /// Adopt the page counts of `layout`; `total_pages` excludes the closer.
    pub fn mount<T>(&mut self, layout: &WizardLayout<T>) {
        self.total_pages = layout.content_pages();
        self.page_count = layout.len();
        self.current_page = self.current_page.clamp(1, self.page_count.max(1));
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    #[must_use]
    pub fn progress(&self) -> WizardProgress {
        WizardProgress {
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }

    /// Move one page forward. A no-op on the final page; there is no wraparound.
    pub fn advance(&mut self) {
        if self.current_page < self.page_count {
            self.current_page += 1;
        }
    }

    #[must_use]
    pub fn is_on_final_page(&self) -> bool {
        self.current_page == self.page_count
    }

    /// Finish the wizard.
    ///
    /// `dismiss` runs only when the final page was reached, and always before
    /// `on_complete`, which runs unconditionally.
    pub fn complete(&self, dismiss: impl FnOnce(), on_complete: impl FnOnce()) {
        if self.is_on_final_page() {
            dismiss();
        }
        on_complete();
    }

    #[must_use]
    pub fn view<'a, T>(&self, layout: &'a WizardLayout<T>, error: bool) -> WizardView<'a, T> {
        if error {
            return WizardView::Error {
                page: layout.error_page(),
            };
        }
        let on_content = self.current_page <= self.total_pages;
        let header = layout
            .header()
            .filter(|_| on_content)
            .map(|header| (header, self.progress()));
        WizardView::Active {
            header,
            page: layout.page(self.current_page),
            show_next: !self.is_on_final_page(),
        }
    }
}
