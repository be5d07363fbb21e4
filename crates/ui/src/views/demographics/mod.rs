mod fields;
mod modal;
mod pages;

pub use modal::DemographicsCollectionModal;

#[cfg(test)]
pub(super) use pages::{FormHandlers, demographics_pages};
