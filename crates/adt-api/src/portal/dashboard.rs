// Dashboard fetch and parse
//
// The dashboard is the only source of panel state. Everything is derived
// from CSS classes on the activation buttons, the battery icon and the
// open-door markers, so this module is where portal UI changes will break
// things first.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::error::Error;
use crate::portal::client::{DASHBOARD_PATH, PortalClient, Session};
use crate::portal::document::{self, any_has_class, first_attr, selector};
use crate::portal::models::{
    ActionHandles, BatteryTier, Dashboard, DashboardDocument, PanelStatus, SensorReading,
};

const ACCEPT_DASHBOARD: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

static ACTIVE_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| selector("#activationButtons .active"));
static NOT_READY_BUTTON: LazyLock<Selector> =
    LazyLock::new(|| selector("#activationButtons .OFF_NOT_READY"));
// JSF prefixes the id with a generated form id (`j_idt135:`), match the suffix.
static BATTERY_PANEL: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[id$="batteryLevelPanel"]"#));
static OPEN_DOOR: LazyLock<Selector> = LazyLock::new(|| selector(".openDoorDash"));
static VIEW_STATE: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"input[type="hidden"][name="javax.faces.ViewState"]"#)
});
static HOME_ACTION: LazyLock<Selector> =
    LazyLock::new(|| selector("#activationButtons li.center a[title]"));
static AWAY_ACTION: LazyLock<Selector> =
    LazyLock::new(|| selector("#activationButtons li.right a[title]"));
static DISARM_ACTION: LazyLock<Selector> =
    LazyLock::new(|| selector("#activationButtons li.left a[title]"));

impl PortalClient {
    /// Fetch the dashboard page with the session's cookies and CSRF token.
    ///
    /// An expired session is redirected back to the login page with
    /// HTTP 200, so landing anywhere but the dashboard path is treated
    /// as [`Error::SessionExpired`].
    pub async fn fetch_dashboard(&self, session: &Session) -> Result<DashboardDocument, Error> {
        let url = self.url(DASHBOARD_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .browser_headers(session.http().get(url), DASHBOARD_PATH, ACCEPT_DASHBOARD)
            .header("X-CSRF-TOKEN", session.csrf_token())
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
        if resp.url().path() != DASHBOARD_PATH {
            debug!(landed = resp.url().path(), "dashboard request was redirected");
            return Err(Error::SessionExpired);
        }

        let html = resp.text().await.map_err(Error::Transport)?;
        Ok(DashboardDocument::new(html))
    }
}

impl DashboardDocument {
    /// Interpret the page. See [`parse_dashboard`].
    pub fn parse(&self) -> Result<Dashboard, Error> {
        parse_dashboard(self)
    }
}

/// Map a dashboard page onto panel status, battery, sensors and the
/// action handles needed for the next command.
///
/// Arming state is read in priority order: the highlighted (`.active`)
/// button's position (`left` disarmed, `center` home, `right` away), then
/// a `left` not-ready indicator. A page matching neither is an error,
/// never a silent "disarmed".
pub fn parse_dashboard(doc: &DashboardDocument) -> Result<Dashboard, Error> {
    let html = Html::parse_document(doc.html());

    let status = parse_status(&html)?;
    let battery = parse_battery(&html);
    let sensors = parse_sensors(&html);
    let handles = parse_handles(&html)?;

    Ok(Dashboard {
        status,
        battery,
        sensors,
        handles,
    })
}

fn parse_status(html: &Html) -> Result<PanelStatus, Error> {
    if any_has_class(html, &ACTIVE_BUTTON, "left") {
        return Ok(PanelStatus::Disarmed);
    }
    if any_has_class(html, &ACTIVE_BUTTON, "center") {
        return Ok(PanelStatus::Home);
    }
    if any_has_class(html, &ACTIVE_BUTTON, "right") {
        return Ok(PanelStatus::Away);
    }
    if any_has_class(html, &NOT_READY_BUTTON, "left") {
        return Ok(PanelStatus::NotReady);
    }

    let active_classes: Vec<String> = html
        .select(&ACTIVE_BUTTON)
        .map(|el| el.value().classes().collect::<Vec<_>>().join(" "))
        .collect();

    Err(Error::UnrecognizedState {
        detail: if active_classes.is_empty() {
            "no active or not-ready activation button".into()
        } else {
            format!("active button classes [{}]", active_classes.join("; "))
        },
    })
}

fn parse_battery(html: &Html) -> BatteryTier {
    if any_has_class(html, &BATTERY_PANEL, "lev1") {
        BatteryTier::Low
    } else if any_has_class(html, &BATTERY_PANEL, "lev2") {
        BatteryTier::Medium
    } else {
        BatteryTier::Full
    }
}

fn parse_sensors(html: &Html) -> Vec<SensorReading> {
    html.select(&OPEN_DOOR)
        .filter_map(|marker| {
            let Some(name) = document::enclosing_title(marker) else {
                warn!("open-door marker without a titled container, skipping");
                return None;
            };
            let closed = marker
                .value()
                .attr("class")
                .is_some_and(|class| class.trim_end().ends_with("off"));
            Some(SensorReading { name, open: !closed })
        })
        .collect()
}

fn parse_handles(html: &Html) -> Result<ActionHandles, Error> {
    let view_state = first_attr(html, &VIEW_STATE, "value");
    let home_action = first_attr(html, &HOME_ACTION, "id");
    let away_action = first_attr(html, &AWAY_ACTION, "id");
    let disarm_action = first_attr(html, &DISARM_ACTION, "id");

    match (view_state, home_action, away_action, disarm_action) {
        (Some(view_state), Some(home_action), Some(away_action), Some(disarm_action)) => {
            Ok(ActionHandles {
                view_state,
                home_action,
                away_action,
                disarm_action,
            })
        }
        (view_state, home_action, away_action, disarm_action) => {
            let missing = [
                ("view state", view_state.is_none()),
                ("home action", home_action.is_none()),
                ("away action", away_action.is_none()),
                ("disarm action", disarm_action.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            Err(Error::MissingActionHandles { missing })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn every_dashboard_selector_compiles() {
        for sel in [
            &ACTIVE_BUTTON,
            &NOT_READY_BUTTON,
            &BATTERY_PANEL,
            &OPEN_DOOR,
            &VIEW_STATE,
            &HOME_ACTION,
            &AWAY_ACTION,
            &DISARM_ACTION,
        ] {
            LazyLock::force(sel);
        }
    }

    const HANDLES: &str = r#"
        <input type="hidden" name="javax.faces.ViewState" value="-4711:1234" />
        <input type="hidden" name="_csrf" value="csrf-auth" />"#;

    fn buttons(left: &str, center: &str, right: &str) -> String {
        format!(
            r##"<ul id="activationButtons">
                <li class="left {left}"><a id="j_idt160:disarm" title="Desactivar" href="#">Off</a></li>
                <li class="center {center}"><a id="j_idt160:home" title="Modo casa" href="#">Home</a></li>
                <li class="right {right}"><a id="j_idt160:away" title="Activar" href="#">On</a></li>
            </ul>"##
        )
    }

    fn page(buttons: &str, battery: &str, extra: &str) -> DashboardDocument {
        DashboardDocument::new(format!(
            r#"<html><body><form id="selfCareForm">
                <div id="j_idt135:batteryLevelPanel" class="battery {battery}"></div>
                {buttons}
                {extra}
                {HANDLES}
            </form></body></html>"#
        ))
    }

    #[test]
    fn active_left_is_disarmed() {
        let dash = page(&buttons("active", "", ""), "lev3", "").parse().unwrap();
        assert_eq!(dash.status, PanelStatus::Disarmed);
    }

    #[test]
    fn active_center_is_home() {
        let dash = page(&buttons("", "active", ""), "lev3", "").parse().unwrap();
        assert_eq!(dash.status, PanelStatus::Home);
    }

    #[test]
    fn active_right_is_away() {
        let dash = page(&buttons("", "", "active"), "lev3", "").parse().unwrap();
        assert_eq!(dash.status, PanelStatus::Away);
    }

    #[test]
    fn not_ready_indicator_without_active_button() {
        let dash = page(&buttons("OFF_NOT_READY", "", ""), "lev3", "")
            .parse()
            .unwrap();
        assert_eq!(dash.status, PanelStatus::NotReady);
    }

    #[test]
    fn active_button_wins_over_not_ready_indicator() {
        let dash = page(&buttons("OFF_NOT_READY", "", "active"), "lev3", "")
            .parse()
            .unwrap();
        assert_eq!(dash.status, PanelStatus::Away);
    }

    #[test]
    fn unrecognized_state_is_an_error() {
        let err = page(&buttons("", "", ""), "lev3", "").parse().unwrap_err();
        assert!(
            matches!(err, Error::UnrecognizedState { .. }),
            "expected UnrecognizedState, got: {err:?}"
        );
    }

    #[test]
    fn empty_document_is_unrecognized_not_disarmed() {
        let err = DashboardDocument::new("<html></html>").parse().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedState { .. }));
    }

    #[test]
    fn battery_tiers() {
        let low = page(&buttons("active", "", ""), "lev1", "").parse().unwrap();
        assert_eq!(low.battery, BatteryTier::Low);
        assert_eq!(low.battery.percent(), 10);
        assert!(low.battery.is_low());

        let medium = page(&buttons("active", "", ""), "lev2", "").parse().unwrap();
        assert_eq!(medium.battery, BatteryTier::Medium);
        assert_eq!(medium.battery.percent(), 50);

        let full = page(&buttons("active", "", ""), "lev4", "").parse().unwrap();
        assert_eq!(full.battery, BatteryTier::Full);
        assert!(!full.battery.is_low());
    }

    #[test]
    fn contact_sensors_in_document_order() {
        let sensors = r#"
            <div class="sensor" title="Puerta principal"><span class="openDoorDash door_on"></span></div>
            <div class="sensor" title="Ventana cocina"><span class="openDoorDash door_off"></span></div>
            <span class="openDoorDash door_on"></span>"#;
        let dash = page(&buttons("active", "", ""), "lev3", sensors)
            .parse()
            .unwrap();

        assert_eq!(
            dash.sensors,
            vec![
                SensorReading {
                    name: "Puerta principal".into(),
                    open: true,
                },
                SensorReading {
                    name: "Ventana cocina".into(),
                    open: false,
                },
            ]
        );
    }

    #[test]
    fn action_handles_are_extracted() {
        let dash = page(&buttons("active", "", ""), "lev3", "").parse().unwrap();
        assert_eq!(
            dash.handles,
            ActionHandles {
                view_state: "-4711:1234".into(),
                home_action: "j_idt160:home".into(),
                away_action: "j_idt160:away".into(),
                disarm_action: "j_idt160:disarm".into(),
            }
        );
    }

    #[test]
    fn missing_view_state_fails_parse() {
        let html = format!(
            r#"<html><body>{}</body></html>"#,
            buttons("active", "", "")
        );
        let err = DashboardDocument::new(html).parse().unwrap_err();
        match err {
            Error::MissingActionHandles { missing } => assert_eq!(missing, vec!["view state"]),
            other => panic!("expected MissingActionHandles, got: {other:?}"),
        }
    }

    #[test]
    fn anchors_without_title_are_not_handles() {
        let html = format!(
            r#"<html><body>
                <ul id="activationButtons">
                    <li class="left active"><a id="off">Off</a></li>
                    <li class="center"><a id="home" title="Casa">Home</a></li>
                    <li class="right"><a id="away" title="Activar">On</a></li>
                </ul>{HANDLES}</body></html>"#
        );
        let err = DashboardDocument::new(html).parse().unwrap_err();
        match err {
            Error::MissingActionHandles { missing } => {
                assert_eq!(missing, vec!["disarm action"]);
            }
            other => panic!("expected MissingActionHandles, got: {other:?}"),
        }
    }
}
