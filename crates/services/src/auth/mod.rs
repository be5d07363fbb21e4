//! Session tokens: the CSRF header for unsafe requests and the JWT cookie.

mod csrf;
mod endpoints;
mod jwt;

pub use csrf::{CsrfTokenService, CsrfTokenSource};
pub use endpoints::HttpTokenEndpoints;
pub use jwt::{JwtTokenService, RefreshOutcome, TokenRefresher};
