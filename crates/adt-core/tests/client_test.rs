#![allow(clippy::unwrap_used)]
// End-to-end tests for `AdtClient` against a wiremock portal.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adt_core::{
    AdtClient, AdtConfig, ArmingMode, ArmingState, ContactSensor, CoreError, RecoveryState,
    SystemState,
};

const FRONTPAGE: &str = "/selfcare/frontpage.xhtml";
const LOGIN: &str = "/selfcare/j_spring_security_check";
const DASHBOARD: &str = "/selfcare/dashboard.xhtml";

// ── Helpers ─────────────────────────────────────────────────────────

fn login_page(token: &str) -> String {
    format!(r#"<html><body><input type="hidden" name="_csrf" value="{token}"/></body></html>"#)
}

/// `position` is the highlighted button (`left`/`center`/`right`), or
/// `None` for a not-ready panel.
fn dashboard(position: Option<&str>, battery: &str) -> String {
    let class = |p: &str| match position {
        Some(active) if active == p => format!("{p} active"),
        None if p == "left" => format!("{p} OFF_NOT_READY"),
        _ => p.to_owned(),
    };
    format!(
        r#"<html><body><form id="selfCareForm">
            <div id="j_idt135:batteryLevelPanel" class="battery {battery}"></div>
            <ul id="activationButtons">
                <li class="{}"><a id="j_idt160:disarm" title="Desactivar">Off</a></li>
                <li class="{}"><a id="j_idt160:home" title="Casa">Home</a></li>
                <li class="{}"><a id="j_idt160:away" title="Activar">On</a></li>
            </ul>
            <div title="Puerta principal"><span class="openDoorDash door_off"></span></div>
            <div title="Ventana cocina"><span class="openDoorDash door_on"></span></div>
            <input type="hidden" name="javax.faces.ViewState" value="-1:2"/>
        </form></body></html>"#,
        class("left"),
        class("center"),
        class("right"),
    )
}

async fn mount_login(server: &MockServer, landing_token: &str) {
    Mock::given(method("GET"))
        .and(path(FRONTPAGE))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "JSESSIONID=anon; Path=/selfcare")
                .set_body_string(login_page("tok-anon")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "JSESSIONID=auth; Path=/selfcare")
                .set_body_string(login_page(landing_token)),
        )
        .mount(server)
        .await;
}

async fn mount_dashboard(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> AdtConfig {
    let mut config = AdtConfig::new(
        "alice",
        SecretString::from("hunter2".to_string()),
        server.uri(),
    );
    config.cache_ttl = Duration::from_secs(60);
    config.target_state_timeout = Duration::from_secs(60);
    config.recovery_backoff = Duration::from_millis(50);
    config.cold_start_timeout = Duration::from_secs(5);
    config.timeout = Duration::from_secs(5);
    config
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_away_panel_end_to_end() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;
    mount_dashboard(&server, dashboard(Some("right"), "lev2")).await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();

    let state = client.get_state().await.unwrap();
    assert_eq!(
        state,
        SystemState {
            arming_state: ArmingState::Away,
            fault_status: false,
            battery_level: 50,
            low_battery_status: false,
            target_state: ArmingState::Away,
            contact_sensors: vec![
                ContactSensor {
                    name: "Puerta principal".into(),
                    is_open: false,
                },
                ContactSensor {
                    name: "Ventana cocina".into(),
                    is_open: true,
                },
            ],
        }
    );
    assert_eq!(client.recovery_state(), RecoveryState::Healthy);

    client.disconnect().await;
}

#[tokio::test]
async fn test_rejected_credentials_fail_connect() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-anon").await;

    let client = AdtClient::new(config(&server)).unwrap();
    let result = client.connect().await;

    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "expected AuthenticationFailed, got: {result:?}"
    );
}

#[tokio::test]
async fn test_recovery_after_three_failed_scrapes_publishes_once() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_dashboard(&server, dashboard(Some("left"), "lev1")).await;

    let client = AdtClient::new(config(&server)).unwrap();
    let mut updates = client.subscribe();
    let mut health = client.recovery_states();

    // The initial scrape fails but connect still succeeds.
    client.connect().await.unwrap();

    tokio::time::timeout(
        Duration::from_secs(5),
        health.wait_for(|state| *state == RecoveryState::Healthy),
    )
    .await
    .unwrap()
    .unwrap();

    let state = updates.next().await.unwrap();
    assert_eq!(state.arming_state, ArmingState::Disarmed);
    assert!(state.low_battery_status);
    assert!(
        tokio::time::timeout(Duration::from_millis(300), updates.next())
            .await
            .is_err(),
        "recovery published more than once"
    );
    assert_eq!(client.get_state().await.unwrap(), state);

    client.disconnect().await;
}

#[tokio::test]
async fn test_expiry_refresh_publishes_new_state() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200).set_body_string(dashboard(Some("left"), "lev3")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_dashboard(&server, dashboard(Some("center"), "lev3")).await;

    let mut config = config(&server);
    config.cache_ttl = Duration::from_millis(100);
    let client = AdtClient::new(config).unwrap();
    let mut updates = client.subscribe();

    client.connect().await.unwrap();

    let first = updates.next().await.unwrap();
    assert_eq!(first.arming_state, ArmingState::Disarmed);

    let refreshed = tokio::time::timeout(Duration::from_secs(5), updates.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.arming_state, ArmingState::Home);

    client.disconnect().await;
}

#[tokio::test]
async fn test_arm_request_masks_stale_state() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;
    mount_dashboard(&server, dashboard(Some("left"), "lev3")).await;

    Mock::given(method("POST"))
        .and(path(DASHBOARD))
        .and(body_string_contains("javax.faces.source=j_idt160%3Aaway"))
        .and(body_string_contains("_csrf=tok-auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<partial-response/>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();

    client.set_state(ArmingMode::Away.code()).await.unwrap();

    let state = client.get_state().await.unwrap();
    assert_eq!(state.arming_state, ArmingState::Disarmed);
    assert_eq!(state.target_state, ArmingState::Away);

    // A scrape that still shows the old state keeps the mask.
    client.refresh_now().await.unwrap();
    assert_eq!(client.get_state().await.unwrap().target_state, ArmingState::Away);

    client.disconnect().await;
}

#[tokio::test]
async fn test_confirming_scrape_clears_target() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;

    // Initial scrape shows the panel disarmed; every later one shows it armed.
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200).set_body_string(dashboard(Some("left"), "lev3")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_dashboard(&server, dashboard(Some("right"), "lev3")).await;

    Mock::given(method("POST"))
        .and(path(DASHBOARD))
        .and(body_string_contains("javax.faces.source=j_idt160%3Aaway"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<partial-response/>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();

    client.change_state(ArmingMode::Away).await.unwrap();
    let masked = client.get_state().await.unwrap();
    assert_eq!(masked.arming_state, ArmingState::Disarmed);
    assert_eq!(masked.target_state, ArmingState::Away);

    let mut updates = client.subscribe();
    client.refresh_now().await.unwrap();

    let confirmed = client.get_state().await.unwrap();
    assert_eq!(confirmed.arming_state, ArmingState::Away);
    assert_eq!(confirmed.target_state, ArmingState::Away);
    assert_eq!(updates.next().await.unwrap(), confirmed);

    client.disconnect().await;
}

#[tokio::test]
async fn test_command_during_cold_start_outage_fails_fast() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;

    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();
    assert!(matches!(client.recovery_state(), RecoveryState::Recovering { .. }));
    assert!(client.try_state().is_none());

    // Well under the 5s cold-start wait.
    let result = tokio::time::timeout(
        Duration::from_secs(1),
        client.change_state(ArmingMode::Away),
    )
    .await
    .unwrap();
    assert!(
        matches!(result, Err(CoreError::Network { .. })),
        "expected Network, got: {result:?}"
    );

    client.disconnect().await;
}

#[tokio::test]
async fn test_login_page_without_token_enters_recovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FRONTPAGE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Mantenimiento</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();

    assert!(matches!(client.recovery_state(), RecoveryState::Recovering { .. }));
    assert!(client.try_state().is_none());

    client.disconnect().await;
}

#[tokio::test]
async fn test_second_connect_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FRONTPAGE))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page("tok-anon")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page("tok-auth")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200).set_body_string(dashboard(Some("left"), "lev3")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();
    client.connect().await.unwrap();

    assert_eq!(client.get_state().await.unwrap().arming_state, ArmingState::Disarmed);
    client.disconnect().await;
}

#[tokio::test]
async fn test_not_ready_panel_refuses_to_arm_without_posting() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;
    mount_dashboard(&server, dashboard(None, "lev3")).await;

    Mock::given(method("POST"))
        .and(path(DASHBOARD))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = AdtClient::new(config(&server)).unwrap();
    client.connect().await.unwrap();

    let state = client.get_state().await.unwrap();
    assert_eq!(state.arming_state, ArmingState::Disarmed);
    assert!(state.fault_status);

    let result = client.change_state(ArmingMode::Away).await;
    assert!(
        matches!(result, Err(CoreError::NotReady)),
        "expected NotReady, got: {result:?}"
    );
    assert_eq!(client.get_state().await.unwrap().target_state, ArmingState::Disarmed);

    client.disconnect().await;
}

#[tokio::test]
async fn test_on_state_change_handler_sees_updates() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-auth").await;
    mount_dashboard(&server, dashboard(Some("center"), "lev2")).await;

    let client = AdtClient::new(config(&server)).unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = client.on_state_change(move |state| {
        let _ = tx.send(state.arming_state);
    });

    client.connect().await.unwrap();
    let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap();
    assert_eq!(seen, Some(ArmingState::Home));

    client.disconnect().await;
    handle.await.unwrap();
}
