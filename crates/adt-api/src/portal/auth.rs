// Portal authentication
//
// Two-step Spring Security form login. The front page hands out an
// anonymous session and CSRF token; posting the login form with that
// token yields the authenticated page carrying a fresh token.

use std::sync::Arc;

use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::error::Error;
use crate::portal::client::{DASHBOARD_PATH, FRONTPAGE_PATH, LOGIN_PATH, PortalClient, Session};
use crate::portal::document;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

impl PortalClient {
    /// Authenticate with the portal and return a fresh [`Session`].
    ///
    /// The portal answers bad credentials by re-rendering the login page
    /// with HTTP 200, so failure is detected heuristically: if the CSRF
    /// token on the page we land on equals the anonymous token we posted,
    /// no login happened.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session, Error> {
        let jar = Arc::new(Jar::default());
        let http = self.transport().build_client(&jar)?;

        // ── Anonymous session ────────────────────────────────────────
        let front_url = self.url(FRONTPAGE_PATH)?;
        debug!("opening anonymous session at {}", front_url);

        let resp = self
            .browser_headers(http.get(front_url), FRONTPAGE_PATH, ACCEPT_HTML)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                path: FRONTPAGE_PATH.into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let anonymous_token =
            document::csrf_token(&body).ok_or(Error::MissingCsrfToken { page: "front" })?;

        // ── Credential submission ────────────────────────────────────
        let login_url = self.url(LOGIN_PATH)?;
        debug!(username, "submitting login form at {}", login_url);

        let form = [
            ("j_username", username),
            ("j_password", password.expose_secret()),
            ("loginButton", "Ir"),
            ("_csrf", anonymous_token.as_str()),
        ];

        let resp = self
            .browser_headers(http.post(login_url).form(&form), FRONTPAGE_PATH, ACCEPT_HTML)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                path: LOGIN_PATH.into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let token =
            document::csrf_token(&body).ok_or(Error::MissingCsrfToken { page: "post-login" })?;

        if token == anonymous_token {
            return Err(Error::Authentication {
                message: "portal re-rendered the login page (CSRF token did not rotate)".into(),
            });
        }

        let session = Session::new(http, jar, self.url(DASHBOARD_PATH)?, token);
        debug!(
            session_cookie = session.session_cookie().is_some(),
            affinity_cookie = session.affinity_cookie().is_some(),
            "login successful"
        );
        Ok(session)
    }
}
