// ── Lifecycle engine ──
//
// Full lifecycle management for one TV connection: credential gate,
// wake-on-LAN sequencing, pairing handshake, reconnection and command
// gating. All transport callbacks funnel through one dispatch point and
// every failure path terminates in a `SessionStatus` transition —
// nothing here may take the process down on a network fault.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use telerc_api::{ClientIdentity, ConnectLeg, KeyCode, KeyDirection, RemoteTransport, TransportEvent};

use crate::classify::{ErrorClass, classify, concise};
use crate::config::{AttemptOrigin, EngineConfig};
use crate::credentials::CredentialStore;
use crate::error::CoreError;
use crate::status::{SessionStatus, StatusCell};
use crate::store::TargetStore;
use crate::target::TargetDevice;
use crate::wake::WakeService;

const EVENT_CHANNEL_SIZE: usize = 32;

// ── RemoteEngine ─────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<EngineInner>`. Owns the single source of
/// truth for [`SessionStatus`], the currently targeted device, and the
/// at-most-one outstanding connection attempt.
#[derive(Clone)]
pub struct RemoteEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    transport: Arc<dyn RemoteTransport>,
    credentials: Arc<dyn CredentialStore>,
    targets: Arc<dyn TargetStore>,
    wake: WakeService,
    status: StatusCell,
    target_tx: watch::Sender<Option<TargetDevice>>,
    state: Mutex<EngineState>,
    /// Root token — cancelled on shutdown. Attempts run on child tokens
    /// so a superseded attempt dies without touching its successor.
    cancel: CancellationToken,
}

#[derive(Default)]
struct EngineState {
    attempt_seq: u64,
    /// The outstanding connect/pairing attempt, if any.
    attempt: Option<Attempt>,
    /// The outstanding wake+connect composite, if any.
    wake_job: Option<Attempt>,
    /// Pairing succeeded and the final session connect is under way.
    awaiting_connection_after_pairing: bool,
}

struct Attempt {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Attempt {
    fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    fn abort(self) {
        self.cancel.cancel();
    }
}

impl RemoteEngine {
    pub fn new(
        config: EngineConfig,
        transport: Arc<dyn RemoteTransport>,
        credentials: Arc<dyn CredentialStore>,
        targets: Arc<dyn TargetStore>,
    ) -> Self {
        let wake = WakeService::new(config.wake_broadcast_override);
        let (target_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(EngineInner {
                config,
                transport,
                credentials,
                targets,
                wake,
                status: StatusCell::new(),
                target_tx,
                state: Mutex::new(EngineState::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to status changes — the one consolidated notification.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Subscribe to PIN-buffer changes.
    pub fn pin(&self) -> watch::Receiver<String> {
        self.inner.status.subscribe_pin()
    }

    /// Subscribe to target changes.
    pub fn current_target(&self) -> watch::Receiver<Option<TargetDevice>> {
        self.inner.target_tx.subscribe()
    }

    pub fn current_status(&self) -> SessionStatus {
        self.inner.status.current()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.status.is_connected()
    }

    fn target(&self) -> Option<TargetDevice> {
        self.inner.target_tx.borrow().clone()
    }

    // ── Target selection ─────────────────────────────────────────────

    /// Select `tv` as the active target and start connecting or pairing.
    pub async fn set_target(&self, tv: TargetDevice) {
        info!(%tv, "setting active target");

        // Switching away from a live session closes it first.
        if self.is_connected() && self.target().is_some_and(|t| t.address != tv.address) {
            debug!("disconnecting previous TV before switching");
            self.inner.transport.disconnect().await;
            self.inner.status.to_loading("Changement de TV...");
        }

        if let Err(e) = self.inner.targets.set_active(Some(&tv)) {
            warn!(error = %e, "persisting active target failed");
        }
        let _ = self.inner.target_tx.send(Some(tv.clone()));

        self.cancel_all_attempts().await;
        self.connect_or_pair(&tv, AttemptOrigin::User).await;
    }

    /// Drop the active target entirely.
    pub async fn clear_target(&self) {
        if self.target().is_none() {
            return;
        }
        debug!("clearing connection target");
        let _ = self.inner.target_tx.send(None);
        self.disconnect().await;
        self.inner
            .status
            .to_no_target("Aucune TV ciblée pour la connexion. Sélectionnez-en une.");
    }

    /// Resume the persisted target, if any (startup path).
    pub async fn auto_connect(&self) {
        match self.inner.targets.active() {
            Some(tv) => {
                info!(%tv, "resuming persisted target");
                let _ = self.inner.target_tx.send(Some(tv.clone()));
                self.connect_or_pair(&tv, AttemptOrigin::Auto).await;
            }
            None => {
                debug!("no persisted target");
                self.inner
                    .status
                    .to_no_target("Aucune TV configurée. Allez dans 'Gérer les TVs'.");
            }
        }
    }

    /// Operator-requested retry: reconnect or re-pair the current target.
    pub async fn retry(&self) {
        let Some(tv) = self.target() else {
            self.inner.status.to_no_target("Aucune TV sélectionnée.");
            return;
        };
        debug!(%tv, "retry requested");
        self.cancel_all_attempts().await;
        self.connect_or_pair(&tv, AttemptOrigin::User).await;
    }

    /// Branch on the credential gate: wake+connect when a pairing
    /// previously succeeded, otherwise start the handshake.
    async fn connect_or_pair(&self, tv: &TargetDevice, origin: AttemptOrigin) {
        if self.inner.credentials.exists() {
            debug!("credential artifact present, attempting connection");
            self.wake_and_connect(tv.clone(), origin).await;
        } else {
            debug!("no credential artifact, starting pairing");
            self.begin_pairing(tv).await;
        }
    }

    // ── Pairing coordinator ──────────────────────────────────────────

    /// Open a fresh pairing handshake toward the target.
    async fn begin_pairing(&self, tv: &TargetDevice) {
        self.cancel_all_attempts().await;
        self.inner.status.to_pairing(
            format!("Lancement de l'appairage avec {}...", tv.display_name()),
            false,
        );
        self.start_attempt(tv.clone(), ConnectLeg::Pairing, true).await;
    }

    /// Submit the operator-entered PIN. An empty PIN is rejected locally
    /// and never reaches the transport.
    pub async fn submit_pin(&self, pin: impl Into<String>) {
        let Some(tv) = self.target() else {
            self.inner
                .status
                .to_pairing("Erreur: Aucune TV pour l'appairage.", false);
            return;
        };

        let pin = pin.into();
        self.inner.status.set_pin(pin.clone());
        if pin.trim().is_empty() {
            self.inner
                .status
                .to_pairing("Le PIN ne peut pas être vide.", true);
            return;
        }

        self.inner
            .status
            .to_pairing(format!("Envoi du PIN à {}...", tv.display_name()), true);
        debug!(digits = pin.len(), "forwarding PIN");

        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.inner.transport.send_secret(&pin).await {
                error!(error = %e, "PIN forwarding failed");
                engine
                    .handle_disconnect_or_error(
                        format!("Erreur envoi PIN: {e}"),
                        true,
                        Some(e.to_string()),
                    )
                    .await;
            }
        });
    }

    /// Update the PIN buffer as the operator types.
    pub fn update_pin(&self, pin: impl Into<String>) {
        self.inner.status.set_pin(pin);
    }

    /// Abandon PIN entry: cancel the handshake, keep the session-less
    /// state retryable.
    pub async fn cancel_pin_entry(&self) {
        self.cancel_pending().await;
        match self.target() {
            None => self.inner.status.to_no_target("Appairage annulé."),
            Some(tv) => self
                .inner
                .status
                .to_cancelled(format!("Appairage annulé pour {}.", tv.display_name())),
        }
    }

    /// Delete the credential artifact and re-pair the current target.
    ///
    /// The universal recovery path for trust failures. Deletion is
    /// idempotent; the persisted active-device association is cleared
    /// when it points at the reset target.
    pub async fn reset_and_repair(&self) {
        let Some(tv) = self.target() else {
            self.inner
                .status
                .to_no_target("Aucune TV pour réinit. appairage.");
            return;
        };
        self.reset_and_repair_for(&tv).await;
    }

    /// [`reset_and_repair`](Self::reset_and_repair) for an explicit
    /// target. The re-pairing only fires if `tv` is still the current
    /// target when the reset completes — a reset raced by a target
    /// switch must not revive the old device.
    pub async fn reset_and_repair_for(&self, tv: &TargetDevice) {
        info!(address = %tv.address, "credential reset and re-pairing");

        self.cancel_all_attempts().await;

        if let Err(e) = self.inner.credentials.delete() {
            // Absence is success; anything else is logged and the
            // re-pairing still proceeds with whatever state remains.
            warn!(error = %e, "credential delete failed");
        }

        if self
            .inner
            .targets
            .active()
            .is_some_and(|active| active.address == tv.address)
        {
            debug!("reset target was the persisted active TV, clearing");
            if let Err(e) = self.inner.targets.set_active(None) {
                warn!(error = %e, "clearing persisted target failed");
            }
        }

        // The target may have been replaced between reset initiation and
        // completion; re-pairing a stale target would fight the new one.
        if self.target().is_some_and(|current| current.address == tv.address) {
            self.begin_pairing(tv).await;
        } else {
            warn!(address = %tv.address, "target changed during reset, dropping re-pair");
        }
    }

    // ── Connection coordinator ───────────────────────────────────────

    /// Wake the target (when a hardware address is known), wait out the
    /// boot delay, then connect. At most one composite job at a time.
    async fn wake_and_connect(&self, tv: TargetDevice, origin: AttemptOrigin) {
        {
            let mut state = self.inner.state.lock().await;
            if state.wake_job.as_ref().is_some_and(Attempt::is_active) {
                debug!("wake+connect already in flight");
                return;
            }
            let generation = state.next_generation();
            let cancel = self.inner.cancel.child_token();
            let engine = self.clone();
            let job_cancel = cancel.clone();
            let task = tokio::spawn(async move {
                engine.run_wake_job(tv, origin, job_cancel).await;
            });
            state.wake_job = Some(Attempt {
                generation,
                cancel,
                task,
            });
        }
    }

    async fn run_wake_job(&self, tv: TargetDevice, origin: AttemptOrigin, cancel: CancellationToken) {
        let user_initiated = origin == AttemptOrigin::User;
        let name = tv.display_name().to_owned();

        let Some(mac) = tv
            .hardware_address
            .as_deref()
            .filter(|mac| !mac.trim().is_empty())
        else {
            // No hardware address: skip the wake, connect directly.
            if user_initiated {
                self.inner
                    .status
                    .to_loading("MAC non définie. Connexion directe...");
            }
            self.connect_session(&tv).await;
            return;
        };

        if user_initiated {
            self.inner
                .status
                .to_loading(format!("Allumage de {name} (WoL)..."));
        }
        // Wake failure is logged and absorbed — it must never abort the
        // connection attempt that follows.
        if let Err(e) = self.inner.wake.send_wake(mac).await {
            warn!(error = %e, "wake packet failed");
        }

        let delay = self.inner.config.wake_delay(origin);
        if user_initiated {
            self.inner.status.to_loading(format!(
                "Attente démarrage {name} ({}s)...",
                delay.as_secs()
            ));
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }

        // The operator may have progressed meanwhile (PIN prompt up, or
        // a session already connected): leave things alone.
        if self.inner.status.pin_entry_visible() || self.is_connected() {
            debug!("skipping post-wake connect, state moved on");
            return;
        }
        if user_initiated {
            self.inner
                .status
                .to_loading(format!("Connexion à {name} après WoL..."));
        }
        self.connect_session(&tv).await;
    }

    /// Open the operational session using the stored credential.
    async fn connect_session(&self, tv: &TargetDevice) {
        match self.inner.credentials.load() {
            Ok(Some(bundle)) => match ClientIdentity::from_pem_bundle(&bundle) {
                Ok(identity) => {
                    self.start_attempt(tv.clone(), ConnectLeg::Session { identity }, false)
                        .await;
                }
                Err(e) => {
                    // A corrupt artifact classifies as a trust failure
                    // and funnels into reset + re-pairing.
                    error!(error = %e, "credential artifact unusable");
                    self.handle_disconnect_or_error(
                        format!("Échec connexion: {e}"),
                        true,
                        Some(e.to_string()),
                    )
                    .await;
                }
            },
            Ok(None) => {
                debug!("credential artifact vanished, pairing instead");
                self.begin_pairing(tv).await;
            }
            Err(e) => {
                error!(error = %e, "credential load failed");
                self.handle_disconnect_or_error(
                    format!("Échec connexion: {e}"),
                    true,
                    Some(e.to_string()),
                )
                .await;
            }
        }
    }

    /// Start one transport attempt, superseding any previous one.
    ///
    /// Returns a boxed future so the attempt's event-pump can recurse back
    /// into this method (pairing → session) without forming an infinitely
    /// sized / `Send`-uninferrable future type.
    fn start_attempt(
        &self,
        tv: TargetDevice,
        leg: ConnectLeg,
        is_pairing_leg: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
        // Show a loading indicator unless pairing drives its own status
        // or a more specific state is already displayed.
        if !is_pairing_leg {
            let current = self.inner.status.current();
            let keep = current.is_connected()
                || current.pin_entry_visible()
                || matches!(
                    current,
                    SessionStatus::Pairing { .. }
                        | SessionStatus::Loading { .. }
                        | SessionStatus::ConnectionError { .. }
                );
            if !keep {
                self.inner
                    .status
                    .to_loading(format!("Connexion à {}...", tv.display_name()));
            }
        }

        // The attempt is registered under the same lock that spawns it,
        // so its first events cannot race the generation check.
        let mut state = self.inner.state.lock().await;
        if let Some(previous) = state.attempt.take() {
            debug!(
                generation = previous.generation,
                "cancelling previous attempt"
            );
            previous.abort();
        }
        let generation = state.next_generation();
        let cancel = self.inner.cancel.child_token();

        let engine = self.clone();
        let attempt_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
            let address = tv.address.clone();
            if let Err(e) = engine
                .inner
                .transport
                .connect(&address, leg, events_tx, attempt_cancel.clone())
                .await
            {
                engine.on_attempt_error(generation, &e.to_string()).await;
                return;
            }

            // Pump transport events into the central dispatch until the
            // leg dies or this attempt is superseded.
            loop {
                tokio::select! {
                    biased;
                    () = attempt_cancel.cancelled() => break,
                    event = events_rx.recv() => {
                        let Some(event) = event else { break };
                        engine.handle_event(generation, event).await;
                    }
                }
            }
        });

        state.attempt = Some(Attempt {
            generation,
            cancel,
            task,
        });
        })
    }

    /// Close the session and cancel anything in flight. Idempotent.
    pub async fn disconnect(&self) {
        debug!("disconnect requested");
        self.cancel_all_attempts().await;
        self.inner.transport.disconnect().await;
    }

    /// Cancel the in-flight attempt without closing an established
    /// session. Cancelling with nothing in flight is a no-op.
    pub async fn cancel_pending(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(attempt) = state.attempt.take() {
            attempt.abort();
        }
    }

    async fn cancel_all_attempts(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(attempt) = state.attempt.take() {
            attempt.abort();
        }
        if let Some(job) = state.wake_job.take() {
            job.abort();
        }
        state.awaiting_connection_after_pairing = false;
    }

    /// Tear the engine down for good.
    pub async fn shutdown(&self) {
        self.disconnect().await;
        self.inner.cancel.cancel();
    }

    // ── Central event dispatch ───────────────────────────────────────

    /// The single point where transport callbacks become state.
    async fn handle_event(&self, generation: u64, event: TransportEvent) {
        if !self.is_current_attempt(generation).await {
            debug!(generation, ?event, "dropping event from superseded attempt");
            return;
        }

        match event {
            TransportEvent::ConnectingToRemote => {
                debug!("transport connecting");
            }
            TransportEvent::SessionCreated => {
                debug!("pairing session created");
            }
            TransportEvent::SecretRequested => {
                let name = self
                    .target()
                    .map_or_else(|| "la TV".to_owned(), |tv| tv.display_name().to_owned());
                self.inner
                    .status
                    .to_pairing(format!("PIN requis par {name}"), true);
            }
            TransportEvent::Paired { identity } => {
                self.on_paired(generation, identity).await;
            }
            TransportEvent::Connected { device_name } => {
                self.on_connected(&device_name).await;
            }
            TransportEvent::Disconnected => {
                let name = self
                    .target()
                    .map_or_else(|| "la TV".to_owned(), |tv| tv.display_name().to_owned());
                self.handle_disconnect_or_error(format!("Déconnexion de {name}."), false, None)
                    .await;
            }
            TransportEvent::Error { message } => {
                self.handle_disconnect_or_error(
                    format!("Erreur: {}", concise(&message, 100)),
                    true,
                    Some(message),
                )
                .await;
            }
        }
    }

    async fn is_current_attempt(&self, generation: u64) -> bool {
        let state = self.inner.state.lock().await;
        state
            .attempt
            .as_ref()
            .is_some_and(|a| a.generation == generation)
    }

    /// Pairing succeeded: commit the artifact, then open the
    /// operational session — unless one is already connected or a newer
    /// attempt is in flight.
    async fn on_paired(&self, generation: u64, identity: Vec<u8>) {
        let Some(tv) = self.target() else {
            warn!("paired but no target, ignoring");
            return;
        };
        info!(%tv, "pairing completed");

        if let Err(e) = self.inner.credentials.store(&identity) {
            error!(error = %e, "persisting credential artifact failed");
            self.handle_disconnect_or_error(
                format!("Erreur: {e}"),
                true,
                Some(e.to_string()),
            )
            .await;
            return;
        }

        self.inner.status.mark_paired();

        let proceed = {
            let mut state = self.inner.state.lock().await;
            let newer_attempt = state
                .attempt
                .as_ref()
                .is_some_and(|a| a.generation != generation && a.is_active());
            if self.is_connected() || newer_attempt {
                false
            } else {
                state.awaiting_connection_after_pairing = true;
                true
            }
        };

        if proceed {
            debug!("PIN accepted, opening final session");
            self.connect_session(&tv).await;
        } else {
            debug!("session already connected or attempt in flight, not reconnecting");
        }
    }

    async fn on_connected(&self, device_name: &str) {
        let Some(tv) = self.target() else {
            warn!("connected but no target, ignoring");
            return;
        };
        let was_pairing = {
            let mut state = self.inner.state.lock().await;
            std::mem::take(&mut state.awaiting_connection_after_pairing)
        };
        if was_pairing {
            info!(%tv, "pairing finalised and session established");
        }
        let name = tv.name.clone().unwrap_or_else(|| device_name.to_owned());
        self.inner.status.to_connected(name, tv.address.clone());
    }

    async fn on_attempt_error(&self, generation: u64, raw: &str) {
        if !self.is_current_attempt(generation).await {
            debug!(generation, "dropping error from superseded attempt");
            return;
        }
        self.handle_disconnect_or_error(
            format!("Échec connexion: {}", concise(raw, 100)),
            true,
            Some(raw.to_owned()),
        )
        .await;
    }

    // ── Classification & recovery ────────────────────────────────────

    /// The only path from a raw failure to a status transition (and,
    /// for recoverable classes, to self-healing).
    async fn handle_disconnect_or_error(
        &self,
        user_message: String,
        is_actual_error: bool,
        raw: Option<String>,
    ) {
        let target = self.target();
        let address = target
            .as_ref()
            .map_or_else(|| "adresse inconnue".to_owned(), |tv| tv.address.clone());
        warn!(%address, message = %user_message, raw = raw.as_deref(), "disconnect or error");

        {
            let mut state = self.inner.state.lock().await;
            state.awaiting_connection_after_pairing = false;
        }

        if let Some(raw) = raw.as_deref() {
            match classify(raw) {
                ErrorClass::Trust => {
                    warn!("trust failure, resetting pairing");
                    self.inner
                        .status
                        .to_loading("Problème d'appairage SSL. Réinitialisation...");
                    self.reset_and_repair().await;
                    return;
                }
                ErrorClass::Secret => {
                    self.inner.status.clear_pin();
                    self.inner
                        .status
                        .to_pairing("PIN incorrect. Veuillez réessayer.", true);
                    return;
                }
                ErrorClass::EmptyPin => {
                    self.inner.status.to_pairing(raw, true);
                    return;
                }
                ErrorClass::Unreachable => {
                    let mut message = format!("TV non joignable ({address}).");
                    if self.inner.status.is_pairing() {
                        message.push_str(" Vérifiez la TV et le réseau.");
                    }
                    self.inner.status.to_error(message);
                    return;
                }
                ErrorClass::Generic => {}
            }
        }

        let display = if is_actual_error {
            let detail = raw
                .as_deref()
                .map_or_else(|| concise(&user_message, 100), |r| concise(r, 80));
            format!("Erreur: {detail}")
        } else {
            user_message
        };
        self.inner.status.to_error(display);
    }

    // ── Command dispatcher ───────────────────────────────────────────

    /// Send one key event on the live session.
    ///
    /// Gate-kept: while not connected this is a logged no-op and never
    /// reaches the transport. Dispatch failures are logged and swallowed
    /// — one lost keypress is not a connection failure.
    pub fn send_key(&self, key: KeyCode) {
        if !self.is_connected() {
            warn!(%key, "cannot send key: not connected");
            return;
        }
        let transport = Arc::clone(&self.inner.transport);
        tokio::spawn(async move {
            match transport.send_key(key, KeyDirection::Short).await {
                Ok(()) => debug!(%key, "key sent"),
                Err(e) => warn!(%key, error = %e, "key send failed"),
            }
        });
    }

    pub fn send_power(&self) {
        self.send_key(KeyCode::Power);
    }
    pub fn send_volume_up(&self) {
        self.send_key(KeyCode::VolumeUp);
    }
    pub fn send_volume_down(&self) {
        self.send_key(KeyCode::VolumeDown);
    }
    pub fn send_mute(&self) {
        self.send_key(KeyCode::Mute);
    }
    pub fn send_channel_up(&self) {
        self.send_key(KeyCode::ChannelUp);
    }
    pub fn send_channel_down(&self) {
        self.send_key(KeyCode::ChannelDown);
    }
    pub fn send_dpad_up(&self) {
        self.send_key(KeyCode::DpadUp);
    }
    pub fn send_dpad_down(&self) {
        self.send_key(KeyCode::DpadDown);
    }
    pub fn send_dpad_left(&self) {
        self.send_key(KeyCode::DpadLeft);
    }
    pub fn send_dpad_right(&self) {
        self.send_key(KeyCode::DpadRight);
    }
    pub fn send_dpad_center(&self) {
        self.send_key(KeyCode::DpadCenter);
    }
    pub fn send_home(&self) {
        self.send_key(KeyCode::Home);
    }
    pub fn send_back(&self) {
        self.send_key(KeyCode::Back);
    }
    pub fn send_play(&self) {
        self.send_key(KeyCode::MediaPlay);
    }
    pub fn send_stop(&self) {
        self.send_key(KeyCode::MediaStop);
    }
    pub fn send_rewind(&self) {
        self.send_key(KeyCode::MediaRewind);
    }
    pub fn send_fast_forward(&self) {
        self.send_key(KeyCode::MediaFastForward);
    }
}

impl EngineState {
    fn next_generation(&mut self) -> u64 {
        self.attempt_seq += 1;
        self.attempt_seq
    }
}

impl std::fmt::Debug for RemoteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteEngine")
            .field("status", &self.current_status().to_string())
            .finish_non_exhaustive()
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Convenience constructor for `CoreError` contexts that need a typed
/// result (used by embedding code, not the engine itself).
impl RemoteEngine {
    /// Current target or [`CoreError::NoTarget`].
    pub fn require_target(&self) -> Result<TargetDevice, CoreError> {
        self.target().ok_or(CoreError::NoTarget)
    }
}
