#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod model;
pub mod time;
pub mod wizard;

pub use error::Error;
pub use time::Clock;
