use std::sync::Arc;

use reqwest::cookie::CookieStore as _;
use reqwest::cookie::Jar;
use url::Url;

/// Cookie jar scoped to the LMS origin.
///
/// The same jar backs the `reqwest::Client`, so cookies set by responses are
/// visible here and values written here ride along on later requests.
#[derive(Clone, Debug)]
pub struct CookieStore {
    jar: Arc<Jar>,
    origin: Url,
}

impl CookieStore {
    #[must_use]
    pub fn new(origin: Url) -> Self {
        Self::with_jar(Arc::new(Jar::default()), origin)
    }

    #[must_use]
    pub fn with_jar(jar: Arc<Jar>, origin: Url) -> Self {
        Self { jar, origin }
    }

    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// True when `target` is served from the origin these cookies belong to.
    #[must_use]
    pub fn is_same_origin(&self, target: &Url) -> bool {
        target.origin() == self.origin.origin()
    }

    #[must_use]
    pub fn jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Current value of `name`, ignoring empty values.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.origin)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    pub fn set(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{name}={value}; Path=/"), &self.origin);
    }

    pub fn remove(&self, name: &str) {
        self.jar
            .add_cookie_str(&format!("{name}=; Path=/; Max-Age=0"), &self.origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CookieStore {
        CookieStore::new(Url::parse("https://lms.example.com/").unwrap())
    }

    #[test]
    fn set_then_get_returns_value() {
        let cookies = store();
        cookies.set("csrftoken", "abc123");
        cookies.set("sessionid", "xyz");
        assert_eq!(cookies.get("csrftoken").as_deref(), Some("abc123"));
        assert_eq!(cookies.get("sessionid").as_deref(), Some("xyz"));
        assert_eq!(cookies.get("missing"), None);
    }

    #[test]
    fn remove_clears_value() {
        let cookies = store();
        cookies.set("edx-jwt-cookie-header-payload", "a.b");
        cookies.remove("edx-jwt-cookie-header-payload");
        assert_eq!(cookies.get("edx-jwt-cookie-header-payload"), None);
    }

    #[test]
    fn same_origin_ignores_path_and_query() {
        let cookies = store();
        assert!(cookies.is_same_origin(&Url::parse("https://lms.example.com/api/x?y=1").unwrap()));
        assert!(!cookies.is_same_origin(&Url::parse("https://ecommerce.example.com/").unwrap()));
        assert!(!cookies.is_same_origin(&Url::parse("http://lms.example.com/").unwrap()));
    }

    #[test]
    fn clones_share_the_jar() {
        let cookies = store();
        let other = cookies.clone();
        other.set("csrftoken", "shared");
        assert_eq!(cookies.get("csrftoken").as_deref(), Some("shared"));
    }
}
