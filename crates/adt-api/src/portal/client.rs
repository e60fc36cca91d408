// Portal HTTP client
//
// Holds the portal base URL and transport settings. It keeps no session
// state of its own: `login` hands back a `Session` that owns its cookie
// jar, and every other endpoint takes that session by reference. Endpoint
// modules (auth, dashboard, action) are inherent methods in separate files.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

pub(crate) const FRONTPAGE_PATH: &str = "/selfcare/frontpage.xhtml";
pub(crate) const LOGIN_PATH: &str = "/selfcare/j_spring_security_check";
pub(crate) const DASHBOARD_PATH: &str = "/selfcare/dashboard.xhtml";

const ACCEPT_LANGUAGE: &str = "es-419,es;q=0.9,en;q=0.8";

/// Raw HTTP client for the ADT Smart Security self-care portal.
#[derive(Debug, Clone)]
pub struct PortalClient {
    base_url: Url,
    transport: TransportConfig,
}

impl PortalClient {
    /// Create a client for the portal rooted at `base_url`
    /// (e.g. `https://smartsecurity.adt.com.ar`).
    pub fn new(base_url: Url, transport: TransportConfig) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    /// The portal base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    /// Build a full URL for a portal path.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    /// Apply the headers a browser sends on every portal request.
    ///
    /// The portal's load balancer and Spring Security filters check
    /// `Origin`/`Referer`; caching must be off or stale dashboards leak
    /// through intermediaries.
    pub(crate) fn browser_headers(
        &self,
        builder: reqwest::RequestBuilder,
        referer_path: &str,
        accept: &str,
    ) -> reqwest::RequestBuilder {
        let origin = self.base_url.as_str().trim_end_matches('/');
        builder
            .header(reqwest::header::ACCEPT, accept)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .header(reqwest::header::ORIGIN, origin)
            .header(reqwest::header::REFERER, format!("{origin}{referer_path}"))
            .header(
                reqwest::header::CACHE_CONTROL,
                "private, no-cache, no-store, must-revalidate, max-age=0",
            )
            .header(reqwest::header::PRAGMA, "no-cache")
            .header(reqwest::header::EXPIRES, "-1")
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// An authenticated portal session.
///
/// Owns its own cookie jar (`JSESSIONID` plus the `BIGipServer*` load
/// balancer affinity cookie) and the CSRF token issued after login.
/// Sessions are never shared: a new login always starts from an empty jar.
#[derive(Clone)]
pub struct Session {
    http: reqwest::Client,
    cookie_jar: Arc<Jar>,
    cookie_scope: Url,
    csrf_token: String,
}

impl Session {
    pub(crate) fn new(
        http: reqwest::Client,
        cookie_jar: Arc<Jar>,
        cookie_scope: Url,
        csrf_token: String,
    ) -> Self {
        Self {
            http,
            cookie_jar,
            cookie_scope,
            csrf_token,
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The authenticated CSRF token, sent as `X-CSRF-TOKEN` / `_csrf`.
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// The `Cookie` header value the jar would send to the dashboard.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookie_jar.cookies(&self.cookie_scope)?;
        cookies.to_str().ok().map(String::from)
    }

    /// The servlet session cookie (`JSESSIONID=...`).
    pub fn session_cookie(&self) -> Option<String> {
        self.find_cookie(|name| name.starts_with("JSESSION"))
    }

    /// The load balancer affinity cookie (`BIGipServer...=...`).
    pub fn affinity_cookie(&self) -> Option<String> {
        self.find_cookie(|name| name.starts_with("BIGipServer"))
    }

    fn find_cookie(&self, matches: impl Fn(&str) -> bool) -> Option<String> {
        self.cookie_header()?
            .split(';')
            .map(str::trim)
            .find(|pair| pair.split('=').next().is_some_and(&matches))
            .map(String::from)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie_scope", &self.cookie_scope.as_str())
            .field("has_session_cookie", &self.session_cookie().is_some())
            .field("has_affinity_cookie", &self.affinity_cookie().is_some())
            .field("csrf_token", &"[redacted]")
            .finish_non_exhaustive()
    }
}
