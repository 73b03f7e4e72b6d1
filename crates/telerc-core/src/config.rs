// ── Engine configuration ──
//
// Tuning for the lifecycle engine. Built by the CLI from the config
// file and handed in — the core never reads files itself.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Configuration for a [`RemoteEngine`](crate::RemoteEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name this client announces during pairing and session setup.
    pub client_name: String,

    /// Delay between the wake packet and the connection attempt when the
    /// engine retries on its own (background attempts).
    pub wake_delay_auto: Duration,

    /// Same delay for user-initiated attempts. Longer: an operator who
    /// just powered the TV on is willing to wait for it to boot.
    pub wake_delay_user: Duration,

    /// Force a specific broadcast address for wake packets instead of
    /// deriving one from the local network configuration.
    pub wake_broadcast_override: Option<Ipv4Addr>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            client_name: "telerc".into(),
            wake_delay_auto: Duration::from_secs(5),
            wake_delay_user: Duration::from_secs(10),
            wake_broadcast_override: None,
        }
    }
}

/// Whether an attempt was requested by the operator or started by the
/// engine itself. Selects the post-wake delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOrigin {
    /// Engine-initiated (startup auto-connect, self-healing retry).
    Auto,
    /// Operator-initiated (explicit retry, target selection).
    User,
}

impl EngineConfig {
    /// Post-wake delay for the given attempt origin.
    pub fn wake_delay(&self, origin: AttemptOrigin) -> Duration {
        match origin {
            AttemptOrigin::Auto => self.wake_delay_auto,
            AttemptOrigin::User => self.wake_delay_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays() {
        let config = EngineConfig::default();
        assert_eq!(config.wake_delay(AttemptOrigin::Auto), Duration::from_secs(5));
        assert_eq!(config.wake_delay(AttemptOrigin::User), Duration::from_secs(10));
    }
}
