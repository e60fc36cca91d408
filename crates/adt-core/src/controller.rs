// ── Panel client facade ──
//
// Full lifecycle for one panel account: login, initial scrape, the
// expiry-driven refresh loop, command routing through the reconciler,
// and recovery after failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use adt_api::transport::{TlsMode, TransportConfig};
use adt_api::{PortalClient, Session};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{AdtConfig, TlsVerification};
use crate::convert;
use crate::error::CoreError;
use crate::model::{ArmingMode, SystemState};
use crate::reconcile;
use crate::recovery::{RecoveryMonitor, RecoveryState};
use crate::store::expiry::expiry_task;
use crate::store::{Commit, StateCache};
use crate::stream::StateStream;

// ── AdtClient ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Reads are served from the
/// cache and never touch the network; only the background refresh and
/// recovery tasks and [`change_state`](Self::change_state) do.
#[derive(Clone)]
pub struct AdtClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: AdtConfig,
    portal: PortalClient,
    cache: Arc<StateCache>,
    recovery: RecoveryMonitor,
    session: Mutex<Option<Session>>,
    connected: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl AdtClient {
    /// Create a client from configuration. Does NOT connect; call
    /// [`connect()`](Self::connect) to log in and start refreshing.
    ///
    /// Missing credentials or domain fail here.
    pub fn new(config: AdtConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let portal = PortalClient::new(config.base_url()?, build_transport(&config));
        let cache = Arc::new(StateCache::new(config.cache_ttl));

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                portal,
                cache,
                recovery: RecoveryMonitor::new(),
                session: Mutex::new(None),
                connected: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the client configuration.
    pub fn config(&self) -> &AdtConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, scrape once, and start the refresh loop.
    ///
    /// Rejected credentials fail the call. Any other failure (portal
    /// down, unreadable dashboard) hands over to the recovery loop and
    /// `connect` still returns `Ok`; `get_state` then waits for the
    /// first successful scrape. Calling it again while connected is a
    /// no-op.
    pub async fn connect(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ClientClosed);
        }
        if self.inner.connected.swap(true, Ordering::AcqRel) {
            debug!("already connected");
            return Ok(());
        }

        let initial = match self.login().await {
            Err(e @ CoreError::AuthenticationFailed { .. }) => {
                self.inner.connected.store(false, Ordering::Release);
                return Err(e);
            }
            Err(e) => Err(e),
            Ok(()) => self.refresh().await,
        };

        let client = self.clone();
        let cancel = self.inner.cancel.clone();
        let cache = Arc::clone(&self.inner.cache);
        self.inner
            .task_handles
            .lock()
            .await
            .push(tokio::spawn(expiry_task(cache, cancel, move || {
                client.clone().on_expiry()
            })));

        match initial {
            Ok(()) => info!("connected to portal"),
            Err(e) => self.start_recovery(&e),
        }
        Ok(())
    }

    /// Stop background tasks and drop the session.
    ///
    /// Pending reads observe [`CoreError::ClientClosed`]; the last
    /// cached state stays readable through [`try_state`](Self::try_state).
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();
        self.inner.cache.stop_expiry();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.session.lock().await = None;
        self.inner.connected.store(false, Ordering::Release);
        debug!("disconnected");
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Current panel state.
    ///
    /// Returns immediately once the first scrape has landed. Before
    /// that, waits up to `cold_start_timeout`.
    pub async fn get_state(&self) -> Result<SystemState, CoreError> {
        if let Some(state) = self.inner.cache.get() {
            return Ok(state);
        }

        let timeout = self.inner.config.cold_start_timeout;
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => Err(CoreError::ClientClosed),
            ready = self.inner.cache.wait_ready(timeout) => ready.ok_or(CoreError::StateUnavailable {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Current panel state without waiting; `None` before the first scrape.
    pub fn try_state(&self) -> Option<SystemState> {
        self.inner.cache.get()
    }

    /// Subscribe to accepted state updates.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.inner.cache.subscribe())
    }

    /// Call `handler` for every accepted state until the client disconnects.
    pub fn on_state_change<F>(&self, mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(SystemState) + Send + 'static,
    {
        let mut stream = self.subscribe();
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    next = stream.next() => match next {
                        Some(state) => handler(state),
                        None => break,
                    },
                }
            }
        })
    }

    /// Current connection health.
    pub fn recovery_state(&self) -> RecoveryState {
        self.inner.recovery.current()
    }

    /// Subscribe to connection health changes.
    pub fn recovery_states(&self) -> watch::Receiver<RecoveryState> {
        self.inner.recovery.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Request a mode by HomeKit target-state code (0 home, 1 away,
    /// 3 disarmed).
    pub async fn set_state(&self, code: u8) -> Result<(), CoreError> {
        let mode = ArmingMode::try_from(code)?;
        self.change_state(mode).await
    }

    /// Request an arming mode.
    ///
    /// Resolves once the portal has accepted the click; the panel
    /// confirms on a later scrape. Until then (or until the target
    /// timeout) reads report `mode` as `target_state`.
    ///
    /// Fails fast with [`CoreError::Network`] while the recovery loop
    /// is running, even before the first scrape has landed.
    pub async fn change_state(&self, mode: ArmingMode) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::ClientClosed);
        }
        self.ensure_reachable()?;

        self.get_state().await?;
        let (state, handles) = self
            .inner
            .cache
            .entry()
            .ok_or(CoreError::StateUnavailable { timeout_secs: 0 })?;

        if !state.accepts(mode) {
            return Err(CoreError::NotReady);
        }
        // Recovery may have started while waiting for the first scrape.
        self.ensure_reachable()?;
        let session = self.session().await?;

        info!(%mode, "requesting arming mode");
        let portal = &self.inner.portal;
        let result = reconcile::request_change(
            &self.inner.cache,
            &state,
            handles,
            mode,
            self.inner.config.target_state_timeout,
            |handles| async move {
                portal
                    .submit_action(&session, &handles, mode.into())
                    .await
                    .map_err(CoreError::from)
            },
        )
        .await;

        if let Err(e) = &result {
            if e.needs_login() {
                self.start_recovery(e);
            }
        }
        result
    }

    /// Scrape now and commit the result, bypassing the expiry timer.
    ///
    /// A failure also hands over to the recovery loop.
    pub async fn refresh_now(&self) -> Result<(), CoreError> {
        let result = self.refresh().await;
        if let Err(e) = &result {
            if e.is_scrape_failure() {
                self.start_recovery(e);
            }
        }
        result
    }

    // ── Internals ────────────────────────────────────────────────

    fn ensure_reachable(&self) -> Result<(), CoreError> {
        if self.inner.recovery.is_recovering() {
            return Err(CoreError::Network {
                message: "portal unreachable, reconnecting".into(),
            });
        }
        Ok(())
    }

    async fn session(&self) -> Result<Session, CoreError> {
        self.inner
            .session
            .lock()
            .await
            .clone()
            .ok_or(CoreError::SessionExpired)
    }

    /// Log in with a fresh cookie jar and replace the session.
    async fn login(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        let session = self
            .inner
            .portal
            .login(&config.username, &config.password)
            .await?;
        debug!(?session, "portal login successful");
        *self.inner.session.lock().await = Some(session);
        Ok(())
    }

    /// One scrape: fetch, parse, commit.
    async fn refresh(&self) -> Result<(), CoreError> {
        let session = self.session().await?;
        let ticket = self.inner.cache.ticket();

        let document = self.inner.portal.fetch_dashboard(&session).await?;
        let (state, handles) = convert::into_state(document.parse()?);

        match self.inner.cache.commit(ticket, state, handles) {
            Commit::Accepted { generation } => debug!(generation, "dashboard refreshed"),
            Commit::Stale => debug!("dashboard scrape superseded by a newer one"),
        }
        Ok(())
    }

    async fn on_expiry(self) {
        if self.inner.cancel.is_cancelled() || self.inner.recovery.is_recovering() {
            return;
        }
        match self.refresh().await {
            Ok(()) => {}
            Err(e) if e.is_scrape_failure() => self.start_recovery(&e),
            Err(e) => debug!(error = %e, "expiry refresh skipped"),
        }
    }

    fn start_recovery(&self, cause: &CoreError) {
        if self.inner.cancel.is_cancelled() || !self.inner.recovery.begin(cause) {
            return;
        }

        let client = self.clone();
        tokio::spawn(async move {
            let inner = &client.inner;
            inner
                .recovery
                .run(inner.config.recovery_backoff, &inner.cancel, |attempt| {
                    let client = &client;
                    async move {
                        debug!(attempt, "re-authenticating");
                        client.login().await?;
                        client.refresh().await
                    }
                })
                .await;
        });
    }
}

/// Build a `TransportConfig` from the client's TLS and timeout settings.
fn build_transport(config: &AdtConfig) -> TransportConfig {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };
    TransportConfig {
        tls,
        timeout: config.timeout,
        ..TransportConfig::default()
    }
}

impl std::fmt::Debug for AdtClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdtClient")
            .field("portal", self.inner.portal.base_url())
            .field("username", &self.inner.config.username)
            .field("recovery", &self.inner.recovery.current())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn construction_requires_credentials_and_domain() {
        let err = AdtClient::new(AdtConfig::new(
            "alice",
            SecretString::from(String::new()),
            "",
        ))
        .unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[tokio::test]
    async fn unsupported_code_is_rejected_before_anything_else() {
        let client = AdtClient::new(AdtConfig::new(
            "alice",
            SecretString::from("pw".to_string()),
            "smartsecurity.adt.com.ar",
        ))
        .unwrap();

        let err = client.set_state(2).await.unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedMode { code: 2 }));
        assert_eq!(client.recovery_state(), RecoveryState::Healthy);
    }

    #[tokio::test]
    async fn disconnected_client_refuses_commands() {
        let client = AdtClient::new(AdtConfig::new(
            "alice",
            SecretString::from("pw".to_string()),
            "smartsecurity.adt.com.ar",
        ))
        .unwrap();
        client.disconnect().await;

        assert!(matches!(
            client.change_state(ArmingMode::Away).await,
            Err(CoreError::ClientClosed)
        ));
        assert!(matches!(client.connect().await, Err(CoreError::ClientClosed)));
        assert!(client.try_state().is_none());
    }
}
