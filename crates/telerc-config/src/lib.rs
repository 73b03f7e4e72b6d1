//! Shared configuration for the telerc CLI.
//!
//! TOML config file (TV profiles, engine tuning), `TELERC_` environment
//! overlay, default XDG paths, and the on-disk active-target store.
//! This crate translates configuration into `telerc_core` types — it
//! never constructs network objects itself.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use telerc_core::{CoreError, EngineConfig, TargetDevice, TargetStore, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no TV named '{name}' in the configuration")]
    UnknownTv { name: String },

    #[error("no TV configured — add one with 'telerc tv add'")]
    NoTvConfigured,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Name of the TV used when none is given on the command line.
    pub default_tv: Option<String>,

    /// Engine tuning.
    #[serde(default)]
    pub engine: EngineSection,

    /// Protocol ports.
    #[serde(default)]
    pub transport: TransportSection,

    /// Known TVs by name.
    #[serde(default)]
    pub tvs: BTreeMap<String, TvProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSection {
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Post-wake delay for background attempts, in seconds.
    #[serde(default = "default_wake_delay_auto")]
    pub wake_delay_auto_secs: u64,

    /// Post-wake delay for user-initiated attempts, in seconds.
    #[serde(default = "default_wake_delay_user")]
    pub wake_delay_user_secs: u64,

    /// Fixed broadcast address for wake packets (derived when unset).
    #[serde(default)]
    pub wake_broadcast: Option<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            wake_delay_auto_secs: default_wake_delay_auto(),
            wake_delay_user_secs: default_wake_delay_user(),
            wake_broadcast: None,
        }
    }
}

fn default_client_name() -> String {
    "telerc".into()
}
fn default_wake_delay_auto() -> u64 {
    5
}
fn default_wake_delay_user() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportSection {
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,

    #[serde(default = "default_pairing_port")]
    pub pairing_port: u16,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            remote_port: default_remote_port(),
            pairing_port: default_pairing_port(),
        }
    }
}

fn default_remote_port() -> u16 {
    6466
}
fn default_pairing_port() -> u16 {
    6467
}

/// A configured TV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TvProfile {
    /// IP address or host name.
    pub address: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Hardware address for Wake-on-LAN.
    #[serde(default)]
    pub hardware_address: Option<String>,
}

impl TvProfile {
    pub fn to_target(&self) -> TargetDevice {
        TargetDevice {
            address: self.address.clone(),
            name: self.name.clone(),
            hardware_address: self.hardware_address.clone(),
        }
    }
}

// ── Loading / saving ────────────────────────────────────────────────

impl Config {
    /// Load configuration: defaults ← TOML file ← `TELERC_*` env.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.map_or_else(config_path, Path::to_path_buf);
        debug!(path = %file.display(), "loading configuration");

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed("TELERC_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration back as TOML.
    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        let file = path.map_or_else(config_path, Path::to_path_buf);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(&file, rendered)?;
        debug!(path = %file.display(), "configuration saved");
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, tv) in &self.tvs {
            if tv.address.trim().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("tvs.{name}.address"),
                    reason: "address must not be empty".into(),
                });
            }
        }
        if let Some(ref broadcast) = self.engine.wake_broadcast {
            broadcast
                .parse::<Ipv4Addr>()
                .map_err(|_| ConfigError::Validation {
                    field: "engine.wake_broadcast".into(),
                    reason: format!("'{broadcast}' is not an IPv4 address"),
                })?;
        }
        Ok(())
    }

    // ── Translation to core types ────────────────────────────────────

    pub fn engine_config(&self) -> EngineConfig {
        // Validation already guaranteed the broadcast parses.
        let wake_broadcast_override = self
            .engine
            .wake_broadcast
            .as_deref()
            .and_then(|b| b.parse().ok());
        EngineConfig {
            client_name: self.engine.client_name.clone(),
            wake_delay_auto: Duration::from_secs(self.engine.wake_delay_auto_secs),
            wake_delay_user: Duration::from_secs(self.engine.wake_delay_user_secs),
            wake_broadcast_override,
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            remote_port: self.transport.remote_port,
            pairing_port: self.transport.pairing_port,
        }
    }

    // ── TV profiles ──────────────────────────────────────────────────

    /// Resolve a TV by explicit name, falling back to the default.
    pub fn resolve_tv(&self, explicit: Option<&str>) -> Result<TargetDevice, ConfigError> {
        let name = explicit
            .map(str::to_owned)
            .or_else(|| self.default_tv.clone())
            .ok_or(ConfigError::NoTvConfigured)?;
        self.tvs
            .get(&name)
            .map(TvProfile::to_target)
            .ok_or(ConfigError::UnknownTv { name })
    }

    /// Add or replace a TV profile; the first TV becomes the default.
    pub fn upsert_tv(&mut self, name: &str, profile: TvProfile) {
        self.tvs.insert(name.to_owned(), profile);
        if self.default_tv.is_none() {
            self.default_tv = Some(name.to_owned());
        }
    }

    pub fn remove_tv(&mut self, name: &str) -> Result<(), ConfigError> {
        self.tvs
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownTv {
                name: name.to_owned(),
            })?;
        if self.default_tv.as_deref() == Some(name) {
            self.default_tv = self.tvs.keys().next().cloned();
        }
        Ok(())
    }
}

// ── Default paths ───────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "telerc", "telerc")
}

/// Default config file path (`…/telerc/telerc.toml`).
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("telerc.toml"),
        |dirs| dirs.config_dir().join("telerc.toml"),
    )
}

/// Default credential-artifact path in the data dir.
pub fn credential_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("remote-identity.pem"),
        |dirs| dirs.data_dir().join("remote-identity.pem"),
    )
}

/// Default active-target state path in the data dir.
pub fn active_target_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("active-tv.toml"),
        |dirs| dirs.data_dir().join("active-tv.toml"),
    )
}

// ── Active-target store ─────────────────────────────────────────────

/// On-disk implementation of the engine's [`TargetStore`] seam:
/// remembers which TV was active across restarts.
pub struct FsTargetStore {
    path: PathBuf,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ActiveState {
    active: Option<TargetDevice>,
}

impl FsTargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_state(&self) -> ActiveState {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return ActiveState::default();
        };
        toml::from_str(&raw).unwrap_or_default()
    }
}

impl TargetStore for FsTargetStore {
    fn active(&self) -> Option<TargetDevice> {
        self.read_state().active
    }

    fn set_active(&self, target: Option<&TargetDevice>) -> Result<(), CoreError> {
        let state = ActiveState {
            active: target.cloned(),
        };
        let rendered = toml::to_string_pretty(&state)
            .map_err(|e| CoreError::Internal(format!("serialize active target: {e}")))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::Internal(format!("create {}: {e}", parent.display())))?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, rendered)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| CoreError::Internal(format!("write {}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.engine.wake_delay_auto_secs, 5);
        assert_eq!(config.engine.wake_delay_user_secs, 10);
        assert_eq!(config.transport.remote_port, 6466);
        assert_eq!(config.transport.pairing_port, 6467);
        assert!(config.tvs.is_empty());
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("telerc.toml");
        std::fs::write(
            &path,
            r#"
default_tv = "salon"

[engine]
wake_delay_user_secs = 15

[tvs.salon]
address = "10.0.0.5"
name = "Living Room"
hardware_address = "AA:BB:CC:DD:EE:FF"
"#,
        )
        .expect("write");

        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.default_tv.as_deref(), Some("salon"));
        assert_eq!(config.engine.wake_delay_user_secs, 15);
        // Untouched fields keep their defaults.
        assert_eq!(config.engine.wake_delay_auto_secs, 5);

        let tv = config.resolve_tv(None).expect("default tv");
        assert_eq!(tv.address, "10.0.0.5");
        assert_eq!(tv.name.as_deref(), Some("Living Room"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(Some(&dir.path().join("nope.toml"))).expect("load");
        assert!(config.tvs.is_empty());
    }

    #[test]
    fn empty_address_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("telerc.toml");
        std::fs::write(&path, "[tvs.bad]\naddress = \"\"\n").expect("write");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn bad_broadcast_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("telerc.toml");
        std::fs::write(&path, "[engine]\nwake_broadcast = \"not-an-ip\"\n").expect("write");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("telerc.toml");

        let mut config = Config::default();
        config.upsert_tv(
            "salon",
            TvProfile {
                address: "10.0.0.5".into(),
                name: Some("Living Room".into()),
                hardware_address: None,
            },
        );
        config.save(Some(&path)).expect("save");

        let reloaded = Config::load(Some(&path)).expect("reload");
        assert_eq!(reloaded.default_tv.as_deref(), Some("salon"));
        assert_eq!(reloaded.tvs, config.tvs);
    }

    #[test]
    fn first_tv_becomes_default_and_removal_moves_it() {
        let mut config = Config::default();
        config.upsert_tv(
            "a",
            TvProfile {
                address: "10.0.0.1".into(),
                name: None,
                hardware_address: None,
            },
        );
        config.upsert_tv(
            "b",
            TvProfile {
                address: "10.0.0.2".into(),
                name: None,
                hardware_address: None,
            },
        );
        assert_eq!(config.default_tv.as_deref(), Some("a"));

        config.remove_tv("a").expect("remove");
        assert_eq!(config.default_tv.as_deref(), Some("b"));
        assert!(matches!(
            config.remove_tv("zz"),
            Err(ConfigError::UnknownTv { .. })
        ));
    }

    #[test]
    fn resolve_unknown_tv_fails() {
        let config = Config::default();
        assert!(matches!(
            config.resolve_tv(Some("ghost")),
            Err(ConfigError::UnknownTv { .. })
        ));
        assert!(matches!(config.resolve_tv(None), Err(ConfigError::NoTvConfigured)));
    }

    #[test]
    fn fs_target_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsTargetStore::new(dir.path().join("state/active-tv.toml"));
        assert!(store.active().is_none());

        let tv = TargetDevice::new("10.0.0.5").with_name("Living Room");
        store.set_active(Some(&tv)).expect("set");
        assert_eq!(store.active(), Some(tv));

        store.set_active(None).expect("clear");
        assert!(store.active().is_none());
    }
}
