//! Demographics collection: choices, the learner's answers and the
//! call-to-action flag.

mod gateway;
mod service;

use serde::{Deserialize, Serialize};

pub use gateway::{
    DemographicsCall, DemographicsGateway, HttpDemographicsGateway, InMemoryDemographicsGateway,
};
pub use service::{DemographicsBootstrap, DemographicsService};

/// Whether the learner should still be invited to answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicsStatus {
    pub show_call_to_action: bool,
}
