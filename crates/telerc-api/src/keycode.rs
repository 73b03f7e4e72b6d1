// ── Remote key codes ──
//
// The command surface of the remote protocol. Wire ids are stable and
// must not be renumbered — the TV side matches on them.

use serde::{Deserialize, Serialize};

/// A remote-control key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum KeyCode {
    Power = 26,
    VolumeUp = 24,
    VolumeDown = 25,
    Mute = 164,
    ChannelUp = 166,
    ChannelDown = 167,
    DpadUp = 19,
    DpadDown = 20,
    DpadLeft = 21,
    DpadRight = 22,
    DpadCenter = 23,
    Home = 3,
    Back = 4,
    MediaPlay = 126,
    MediaStop = 86,
    MediaRewind = 89,
    MediaFastForward = 90,
}

impl KeyCode {
    /// All supported keys, in display order.
    pub const ALL: [KeyCode; 17] = [
        KeyCode::Power,
        KeyCode::VolumeUp,
        KeyCode::VolumeDown,
        KeyCode::Mute,
        KeyCode::ChannelUp,
        KeyCode::ChannelDown,
        KeyCode::DpadUp,
        KeyCode::DpadDown,
        KeyCode::DpadLeft,
        KeyCode::DpadRight,
        KeyCode::DpadCenter,
        KeyCode::Home,
        KeyCode::Back,
        KeyCode::MediaPlay,
        KeyCode::MediaStop,
        KeyCode::MediaRewind,
        KeyCode::MediaFastForward,
    ];

    /// CLI-facing name (`kebab-case`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::VolumeUp => "volume-up",
            Self::VolumeDown => "volume-down",
            Self::Mute => "mute",
            Self::ChannelUp => "channel-up",
            Self::ChannelDown => "channel-down",
            Self::DpadUp => "up",
            Self::DpadDown => "down",
            Self::DpadLeft => "left",
            Self::DpadRight => "right",
            Self::DpadCenter => "ok",
            Self::Home => "home",
            Self::Back => "back",
            Self::MediaPlay => "play",
            Self::MediaStop => "stop",
            Self::MediaRewind => "rewind",
            Self::MediaFastForward => "fast-forward",
        }
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for KeyCode {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyCode::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownKey(s.to_owned()))
    }
}

/// Parse error for [`KeyCode::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key '{0}'")]
pub struct UnknownKey(pub String);

/// How a key event is performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyDirection {
    /// Press and release.
    #[default]
    Short,
    /// Long press.
    Long,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_names() {
        for key in KeyCode::ALL {
            let parsed: KeyCode = key.name().parse().expect("known name");
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn unknown_name_rejected() {
        assert!("eject".parse::<KeyCode>().is_err());
    }

    #[test]
    fn all_covers_every_key() {
        // 17 keys: power, volume x3, channel x2, dpad x5, home, back, media x4
        assert_eq!(KeyCode::ALL.len(), 17);
    }
}
