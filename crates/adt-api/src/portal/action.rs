// Command submission
//
// Arming and disarming are JSF "partial ajax" clicks on the dashboard's
// activation buttons, replayed as a form POST.

use tracing::debug;

use crate::error::Error;
use crate::portal::client::{DASHBOARD_PATH, PortalClient, Session};
use crate::portal::models::{ActionHandles, PanelAction};

impl PortalClient {
    /// Click the activation button for `action`.
    ///
    /// `handles` must come from the most recent dashboard scrape; the
    /// view-state token is single-use on the portal side. A successful
    /// response only means the click was accepted; the panel state change
    /// shows up on a later scrape.
    pub async fn submit_action(
        &self,
        session: &Session,
        handles: &ActionHandles,
        action: PanelAction,
    ) -> Result<(), Error> {
        let url = self.url(DASHBOARD_PATH)?;
        let action_id = handles.action_id(action);
        debug!(?action, action_id, "POST {}", url);

        let execute = format!("{action_id} {action_id}");
        let form = [
            ("selfCareForm", "selfCareForm"),
            ("dummy", ""),
            ("_csrf", session.csrf_token()),
            ("javax.faces.ViewState", handles.view_state.as_str()),
            ("javax.faces.source", action_id),
            ("javax.faces.partial.event", "click"),
            ("javax.faces.partial.execute", execute.as_str()),
            ("javax.faces.behavior.event", "action"),
            ("javax.faces.partial.ajax", "true"),
        ];

        let resp = self
            .browser_headers(session.http().post(url).form(&form), DASHBOARD_PATH, "*/*")
            .header("Faces-Request", "partial/ajax")
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::SessionExpired);
        }
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                path: DASHBOARD_PATH.into(),
            });
        }

        // An expired session answers the ajax call with a partial-response
        // redirect to the login page instead of an HTTP error.
        let body = resp.text().await.map_err(Error::Transport)?;
        if body.contains("<redirect") {
            return Err(Error::SessionExpired);
        }

        debug!(?action, "action accepted");
        Ok(())
    }
}
