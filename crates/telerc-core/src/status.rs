//! Session status: the single externally observable engine state.
//!
//! Exactly one [`SessionStatus`] is active at any instant. It is only
//! reachable through the named transitions on [`StatusCell`] — no field
//! writes from coordinators — and every transition is broadcast on a
//! `watch` channel as the one consolidated status notification.

use tokio::sync::watch;
use tracing::debug;

// ── SessionStatus ────────────────────────────────────────────────────

/// Externally observable engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Engine constructed, nothing requested yet.
    Idle,
    /// A connection or wake sequence is under way.
    Loading { message: String },
    /// A pairing handshake is under way; `pin_entry_visible` only has
    /// meaning in this state.
    Pairing {
        message: String,
        pin_entry_visible: bool,
    },
    /// Operational session established.
    Connected {
        device_name: String,
        device_address: String,
    },
    /// An attempt failed; the operator may retry.
    ConnectionError { message: String },
    /// No target device is configured.
    NoTargetConfigured { message: String },
}

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    pub fn is_pairing(&self) -> bool {
        matches!(self, Self::Pairing { .. })
    }

    pub fn pin_entry_visible(&self) -> bool {
        matches!(
            self,
            Self::Pairing {
                pin_entry_visible: true,
                ..
            }
        )
    }

    /// The status text a UI would render.
    pub fn message(&self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Loading { message }
            | Self::Pairing { message, .. }
            | Self::ConnectionError { message }
            | Self::NoTargetConfigured { message } => message.clone(),
            Self::Connected { device_name, .. } => format!("Connecté à {device_name}"),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading { .. } => write!(f, "Loading"),
            Self::Pairing { .. } => write!(f, "Pairing"),
            Self::Connected { .. } => write!(f, "Connected"),
            Self::ConnectionError { .. } => write!(f, "ConnectionError"),
            Self::NoTargetConfigured { .. } => write!(f, "NoTargetConfigured"),
        }
    }
}

// ── StatusCell ───────────────────────────────────────────────────────

/// Owner of the status and PIN-buffer channels.
///
/// The PIN buffer is short-lived: cleared on every transition except
/// the re-prompt after a rejected PIN.
pub struct StatusCell {
    status: watch::Sender<SessionStatus>,
    pin: watch::Sender<String>,
}

impl StatusCell {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SessionStatus::Idle);
        let (pin, _) = watch::channel(String::new());
        Self { status, pin }
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_pin(&self) -> watch::Receiver<String> {
        self.pin.subscribe()
    }

    pub fn current(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    pub fn is_pairing(&self) -> bool {
        self.status.borrow().is_pairing()
    }

    pub fn pin_entry_visible(&self) -> bool {
        self.status.borrow().pin_entry_visible()
    }

    // ── Transitions ──────────────────────────────────────────────────

    pub fn to_loading(&self, message: impl Into<String>) {
        self.transition(SessionStatus::Loading {
            message: message.into(),
        });
    }

    /// Enter (or update) the pairing state. Entering without a visible
    /// PIN prompt clears the buffer; the re-prompt after a rejected PIN
    /// keeps the field visible and the buffer is cleared by the caller.
    pub fn to_pairing(&self, message: impl Into<String>, pin_entry_visible: bool) {
        if !pin_entry_visible {
            self.clear_pin();
        }
        self.transition(SessionStatus::Pairing {
            message: message.into(),
            pin_entry_visible,
        });
    }

    pub fn to_connected(&self, device_name: impl Into<String>, device_address: impl Into<String>) {
        self.clear_pin();
        self.transition(SessionStatus::Connected {
            device_name: device_name.into(),
            device_address: device_address.into(),
        });
    }

    /// Enter the connection-error state.
    ///
    /// Guard: a generic error must not clobber an in-progress pairing —
    /// a stray late disconnect would otherwise hide an active PIN
    /// prompt. While pairing, only the message is updated.
    pub fn to_error(&self, message: impl Into<String>) {
        let message = message.into();
        let current = self.status.borrow().clone();
        if let SessionStatus::Pairing {
            pin_entry_visible, ..
        } = current
        {
            debug!(%message, "error during pairing, keeping pairing state");
            self.transition(SessionStatus::Pairing {
                message,
                pin_entry_visible,
            });
        } else {
            self.transition(SessionStatus::ConnectionError { message });
        }
    }

    /// Operator abandoned PIN entry. Targets the error state
    /// explicitly, so the pairing guard does not apply.
    pub fn to_cancelled(&self, message: impl Into<String>) {
        self.clear_pin();
        self.transition(SessionStatus::ConnectionError {
            message: message.into(),
        });
    }

    /// Enter the no-target state. Unlike [`to_error`](Self::to_error)
    /// this is not guarded: removing the target always wins.
    pub fn to_no_target(&self, message: impl Into<String>) {
        self.clear_pin();
        self.transition(SessionStatus::NoTargetConfigured {
            message: message.into(),
        });
    }

    /// The TV accepted the PIN: hide the prompt, clear the buffer, and
    /// report that the final connection is opening.
    pub fn mark_paired(&self) {
        self.clear_pin();
        self.transition(SessionStatus::Pairing {
            message: "PIN accepté. Connexion en cours...".into(),
            pin_entry_visible: false,
        });
    }

    // ── PIN buffer ───────────────────────────────────────────────────

    pub fn set_pin(&self, pin: impl Into<String>) {
        let _ = self.pin.send(pin.into());
    }

    pub fn clear_pin(&self) {
        let _ = self.pin.send(String::new());
    }

    pub fn current_pin(&self) -> String {
        self.pin.borrow().clone()
    }

    fn transition(&self, next: SessionStatus) {
        debug!(from = %*self.status.borrow(), to = %next, "status transition");
        let _ = self.status.send(next);
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
