use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::error::TokenError;
use crate::http::RetryPolicy;

use super::{CsrfTokenSource, RefreshOutcome, TokenRefresher};

/// The LMS endpoints that mint CSRF tokens and reissue the JWT cookie.
///
/// `client` must share its cookie jar with the rest of the app so the
/// refreshed cookie lands where `JwtTokenService` reads it.
#[derive(Clone, Debug)]
pub struct HttpTokenEndpoints {
    client: Client,
    csrf_token_api_path: String,
    refresh_url: Url,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: Option<String>,
}

impl HttpTokenEndpoints {
    #[must_use]
    pub fn new(
        client: Client,
        csrf_token_api_path: impl Into<String>,
        refresh_url: Url,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            csrf_token_api_path: csrf_token_api_path.into(),
            refresh_url,
            retry,
        }
    }

    /// Token endpoint on the same origin as `target`.
    fn csrf_url(&self, target: &Url) -> Result<Url, TokenError> {
        if target.host_str().is_none() {
            return Err(TokenError::NoHost(target.to_string()));
        }
        target
            .join(&self.csrf_token_api_path)
            .map_err(|_| TokenError::NoHost(target.to_string()))
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, TokenError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(TokenError::HttpStatus(response.status()));
        }
        let body: CsrfTokenResponse = response.json().await?;
        body.csrf_token
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::MissingCsrfToken)
    }
}

fn is_transport_failure(err: &TokenError) -> bool {
    matches!(err, TokenError::Http(inner) if inner.is_connect() || inner.is_timeout() || inner.is_request())
}

#[async_trait]
impl CsrfTokenSource for HttpTokenEndpoints {
    async fn fetch_csrf_token(&self, target: &Url) -> Result<String, TokenError> {
        let url = self.csrf_url(target)?;
        self.retry
            .run(|| self.fetch_once(&url), is_transport_failure)
            .await
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenEndpoints {
    async fn refresh(&self) -> Result<RefreshOutcome, TokenError> {
        let request = self
            .client
            .post(self.refresh_url.clone())
            .header("USE-JWT-COOKIE", "true");
        let response = self.retry.send_with_retry(request).await?;
        match response.status() {
            StatusCode::UNAUTHORIZED => Ok(RefreshOutcome::Unauthenticated),
            status if status.is_success() => Ok(RefreshOutcome::Refreshed),
            status => Err(TokenError::HttpStatus(status)),
        }
    }
}
