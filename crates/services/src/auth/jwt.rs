use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use support_core::Clock;
use support_core::auth::JwtClaims;

use crate::error::TokenError;
use crate::http::CookieStore;

/// Result of asking the LMS to reissue the JWT cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The server set a new cookie.
    Refreshed,
    /// The server answered 401: there is no session to refresh.
    Unauthenticated,
}

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<RefreshOutcome, TokenError>;
}

type Outcome = Result<Option<JwtClaims>, Arc<TokenError>>;
type InFlight = Arc<OnceCell<Outcome>>;

/// Keeps the JWT cookie fresh.
///
/// The cookie is decoded on every call and used while unexpired. Otherwise a
/// refresh runs; concurrent callers share it and its outcome, including a
/// failure.
pub struct JwtTokenService {
    refresher: Arc<dyn TokenRefresher>,
    cookies: CookieStore,
    cookie_name: String,
    clock: Clock,
    in_flight: Mutex<Option<InFlight>>,
}

impl JwtTokenService {
    #[must_use]
    pub fn new(
        refresher: Arc<dyn TokenRefresher>,
        cookies: CookieStore,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            refresher,
            cookies,
            cookie_name: cookie_name.into(),
            clock: Clock::default(),
            in_flight: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Claims of a live session, or `None` when the learner is signed out.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` when the cookie cannot be decoded or the refresh
    /// request fails for a reason other than 401.
    pub async fn get_jwt(&self) -> Result<Option<JwtClaims>, TokenError> {
        if let Some(claims) = self.decode_cookie()? {
            if !claims.is_expired(&self.clock) {
                return Ok(Some(claims));
            }
            debug!(exp = claims.exp, "jwt cookie expired");
        }

        let cell = self.join_in_flight();
        let outcome = cell
            .get_or_init(|| async { self.refresh_now().await.map_err(Arc::new) })
            .await
            .clone();
        self.leave_in_flight(&cell);
        outcome.map_err(TokenError::Shared)
    }

    /// Decode the current cookie without refreshing.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Jwt` when the cookie is present but malformed.
    pub fn decode_cookie(&self) -> Result<Option<JwtClaims>, TokenError> {
        self.cookies
            .get(&self.cookie_name)
            .map(|raw| JwtClaims::decode(&raw))
            .transpose()
            .map_err(TokenError::from)
    }

    async fn refresh_now(&self) -> Result<Option<JwtClaims>, TokenError> {
        debug!("refreshing jwt cookie");
        match self.refresher.refresh().await? {
            RefreshOutcome::Unauthenticated => {
                info!("no session to refresh, clearing jwt cookie");
                self.cookies.remove(&self.cookie_name);
                Ok(None)
            }
            RefreshOutcome::Refreshed => {
                let claims = self.decode_cookie()?.ok_or(TokenError::MissingJwtCookie)?;
                Ok(Some(claims))
            }
        }
    }

    fn join_in_flight(&self) -> InFlight {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(in_flight.get_or_insert_with(InFlight::default))
    }

    fn leave_in_flight(&self, cell: &InFlight) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, cell))
        {
            *in_flight = None;
        }
    }
}
