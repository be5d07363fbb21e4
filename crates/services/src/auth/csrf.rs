use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::error::TokenError;
use crate::http::CookieStore;

/// Fetches a fresh CSRF token for the origin of `target`.
#[async_trait]
pub trait CsrfTokenSource: Send + Sync {
    async fn fetch_csrf_token(&self, target: &Url) -> Result<String, TokenError>;
}

type Outcome = Result<String, Arc<TokenError>>;
type InFlight = Arc<OnceCell<Outcome>>;

/// Supplies the `X-CSRFToken` header for unsafe requests.
///
/// Lookup order: the CSRF cookie (LMS origin only), then tokens fetched
/// earlier for the same domain, then a new fetch. Concurrent callers for one
/// domain share a single fetch and its outcome, success or failure.
pub struct CsrfTokenService {
    source: Arc<dyn CsrfTokenSource>,
    cookies: CookieStore,
    cookie_name: String,
    cache: Mutex<HashMap<String, String>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl CsrfTokenService {
    #[must_use]
    pub fn new(
        source: Arc<dyn CsrfTokenSource>,
        cookies: CookieStore,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            cookies,
            cookie_name: cookie_name.into(),
            cache: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Token to send with an unsafe request to `target`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` when `target` has no host or the fetch fails. A
    /// failed fetch is not cached; the next call tries again.
    pub async fn get_token(&self, target: &Url) -> Result<String, TokenError> {
        let domain = target
            .host_str()
            .ok_or_else(|| TokenError::NoHost(target.to_string()))?
            .to_string();
        let lms_origin = self.cookies.is_same_origin(target);
        if lms_origin {
            if let Some(token) = self.cookies.get(&self.cookie_name) {
                return Ok(token);
            }
        }
        if let Some(token) = self.cached(&domain) {
            return Ok(token);
        }

        let cell = self.join_in_flight(&domain);
        let outcome = cell
            .get_or_init(|| self.fetch(target, &domain, lms_origin))
            .await
            .clone();
        self.leave_in_flight(&domain, &cell);
        outcome.map_err(TokenError::Shared)
    }

    /// Runs once per in-flight cell. The cache is filled before the cell
    /// resolves, so a caller arriving after the cell is dropped finds it.
    async fn fetch(&self, target: &Url, domain: &str, lms_origin: bool) -> Outcome {
        debug!(%domain, "fetching csrf token");
        let token = self
            .source
            .fetch_csrf_token(target)
            .await
            .map_err(Arc::new)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(domain.to_string(), token.clone());
        if lms_origin {
            self.cookies.set(&self.cookie_name, &token);
        }
        Ok(token)
    }

    /// Forget cached tokens, e.g. after the server rejected one.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.cookies.remove(&self.cookie_name);
    }

    fn cached(&self, domain: &str) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .cloned()
    }

    fn join_in_flight(&self, domain: &str) -> InFlight {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.entry(domain.to_string()).or_default())
    }

    fn leave_in_flight(&self, domain: &str, cell: &InFlight) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(domain)
            .is_some_and(|current| Arc::ptr_eq(current, cell))
        {
            in_flight.remove(domain);
        }
    }
}
