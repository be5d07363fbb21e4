//! HTTP plumbing shared by every LMS gateway.

mod client;
mod cookies;
mod retry;

pub use client::LmsClient;
pub use cookies::CookieStore;
pub use retry::RetryPolicy;
