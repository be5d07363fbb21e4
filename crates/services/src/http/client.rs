use std::sync::Arc;

use reqwest::{Client, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use support_core::auth::JwtClaims;

use crate::auth::{CsrfTokenService, HttpTokenEndpoints, JwtTokenService};
use crate::config::SupportConfig;
use crate::error::{ConfigError, HttpError};

use super::{CookieStore, RetryPolicy};

/// Authenticated JSON client for the LMS.
///
/// Every request carries `USE-JWT-COOKIE: true`. Unsafe methods also carry the
/// CSRF token for the target origin. Transport failures are retried per the
/// configured `RetryPolicy`; error statuses are not.
#[derive(Clone)]
pub struct LmsClient {
    client: Client,
    base_url: Url,
    cookies: CookieStore,
    csrf: Arc<CsrfTokenService>,
    jwt: Arc<JwtTokenService>,
    retry: RetryPolicy,
}

impl LmsClient {
    /// Build a client whose token helpers talk to the configured LMS.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the http client cannot be built or the refresh
    /// endpoint does not join onto the base url.
    pub fn new(config: &SupportConfig) -> Result<Self, ConfigError> {
        let cookies = CookieStore::new(config.base_url.clone());
        let client = Client::builder().cookie_provider(cookies.jar()).build()?;
        let refresh_url =
            config
                .refresh_url()
                .map_err(|source| ConfigError::InvalidBaseUrl {
                    raw: config.refresh_endpoint.clone(),
                    source,
                })?;
        let endpoints = Arc::new(HttpTokenEndpoints::new(
            client.clone(),
            config.csrf_token_api_path.clone(),
            refresh_url,
            config.retry.clone(),
        ));
        let csrf = CsrfTokenService::new(
            endpoints.clone(),
            cookies.clone(),
            config.csrf_cookie_name.clone(),
        );
        let jwt = JwtTokenService::new(endpoints, cookies.clone(), config.jwt_cookie_name.clone());
        Ok(Self::from_parts(
            client,
            config.base_url.clone(),
            cookies,
            csrf,
            jwt,
            config.retry.clone(),
        ))
    }

    /// Assemble a client from already-built token helpers.
    #[must_use]
    pub fn from_parts(
        client: Client,
        base_url: Url,
        cookies: CookieStore,
        csrf: CsrfTokenService,
        jwt: JwtTokenService,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url,
            cookies,
            csrf: Arc::new(csrf),
            jwt: Arc::new(jwt),
            retry,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Claims of the signed-in user, refreshing the cookie when needed.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Token` when the cookie is malformed or the refresh fails.
    pub async fn authenticated_user(&self) -> Result<Option<JwtClaims>, HttpError> {
        Ok(self.jwt.get_jwt().await?)
    }

    /// # Errors
    ///
    /// Returns `HttpError` on transport failure, error status or bad JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        self.get_json_with_query(path, &[]).await
    }

    /// # Errors
    ///
    /// Returns `HttpError` on transport failure, error status or bad JSON.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, HttpError> {
        let response = self.execute(Method::GET, path, query, None).await?;
        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Returns `HttpError` on transport failure, error status or bad JSON.
    pub async fn options_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.execute(Method::OPTIONS, path, &[], None).await?;
        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Returns `HttpError` on transport failure, error status or bad JSON.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, &[], Some(body)).await?;
        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Returns `HttpError` on transport failure, error status or bad JSON.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::PATCH, path, &[], Some(body)).await?;
        Ok(response.json().await?)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Response, HttpError> {
        let url = self.base_url.join(path)?;
        if self.jwt.get_jwt().await?.is_none() {
            debug!(%url, "sending request without a session");
        }

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("USE-JWT-COOKIE", "true");
        if !query.is_empty() {
            request = request.query(query);
        }
        if !method.is_safe() {
            let token = self.csrf.get_token(&url).await?;
            request = request.header("X-CSRFToken", token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!(%method, %url, "lms request");
        let response = self.retry.send_with_retry(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        warn!(%method, %url, %status, "lms request failed");
        Err(HttpError::from_status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use support_core::Clock;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Debug, Clone)]
    struct SeenRequest {
        method: String,
        path: String,
        headers: Vec<(String, String)>,
    }

    impl SeenRequest {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }
    }

    async fn read_request(stream: &mut TcpStream) -> Option<SeenRequest> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let mut start = lines.next()?.split(' ');
        let method = start.next()?.to_string();
        let path = start.next()?.to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();
        let length = headers
            .iter()
            .find(|(k, _)| k == "content-length")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        Some(SeenRequest {
            method,
            path,
            headers,
        })
    }

    /// Serves the CSRF token endpoint and answers everything else with 500.
    async fn spawn_lms() -> (Url, Arc<Mutex<Vec<SeenRequest>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut stream).await else {
                        return;
                    };
                    let (status, body) = if request.path.starts_with("/csrf/api/v1/token") {
                        ("200 OK", r#"{"csrfToken": "tok"}"#)
                    } else {
                        ("500 Internal Server Error", r#"{"error": "boom"}"#)
                    };
                    log.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        (base, seen)
    }

    #[tokio::test]
    async fn patch_carries_session_headers_and_is_not_retried_after_a_response() {
        let (base, seen) = spawn_lms().await;
        let mut config = SupportConfig::new(base);
        config.retry = RetryPolicy::immediate(2);
        let client = LmsClient::new(&config).unwrap();
        let live = JwtClaims {
            exp: Clock::system().unix_seconds() + 3600,
            preferred_username: Some("staff".into()),
            user_id: Some(3),
            email: None,
            administrator: true,
        };
        client
            .cookies()
            .set(&config.jwt_cookie_name, &live.encode_unsigned());

        let err = client
            .patch_json::<_, Value>(
                "/demographics/api/v1/demographics/7/",
                &serde_json::json!({"gender": "woman"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HttpError::Status(StatusCode::INTERNAL_SERVER_ERROR)
        ));

        let seen = seen.lock().unwrap().clone();
        let patches: Vec<_> = seen.iter().filter(|r| r.method == "PATCH").collect();
        assert_eq!(patches.len(), 1, "requests seen: {seen:?}");
        assert_eq!(seen.len(), 2, "expected one csrf fetch and one patch: {seen:?}");
        let patch = patches[0];
        assert_eq!(patch.path, "/demographics/api/v1/demographics/7/");
        assert_eq!(patch.header("use-jwt-cookie"), Some("true"));
        assert_eq!(patch.header("x-csrftoken"), Some("tok"));
        assert_eq!(patch.header("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn safe_requests_skip_the_csrf_token() {
        let (base, seen) = spawn_lms().await;
        let mut config = SupportConfig::new(base);
        config.retry = RetryPolicy::immediate(2);
        let client = LmsClient::new(&config).unwrap();
        let live = JwtClaims {
            exp: Clock::system().unix_seconds() + 3600,
            preferred_username: None,
            user_id: Some(3),
            email: None,
            administrator: false,
        };
        client
            .cookies()
            .set(&config.jwt_cookie_name, &live.encode_unsigned());

        assert!(client.get_json::<Value>("/support/enrollment/learner").await.is_err());
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1, "requests seen: {seen:?}");
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].header("use-jwt-cookie"), Some("true"));
        assert_eq!(seen[0].header("x-csrftoken"), None);
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            HttpError::from_status(StatusCode::NOT_FOUND),
            HttpError::NotFound
        ));
        assert!(matches!(
            HttpError::from_status(StatusCode::UNAUTHORIZED),
            HttpError::Unauthorized
        ));
        assert!(matches!(
            HttpError::from_status(StatusCode::BAD_GATEWAY),
            HttpError::Status(StatusCode::BAD_GATEWAY)
        ));
    }

    #[test]
    fn builds_from_config() {
        let config = SupportConfig::new(Url::parse("https://lms.example.com").unwrap());
        let client = LmsClient::new(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "https://lms.example.com/");
        client.cookies().set("csrftoken", "abc");
        assert_eq!(client.cookies().get("csrftoken").as_deref(), Some("abc"));
    }
}
