//! Wire protocol: framing and message types.
//!
//! Every message travels as one frame: a varint length prefix followed
//! by the bincode-encoded payload. Frames are capped at 8 KiB — anything
//! larger is treated as stream corruption and kills the connection
//! rather than risking an unbounded allocation.

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Error;
use crate::keycode::{KeyCode, KeyDirection};

/// Maximum payload size accepted on the wire.
pub const MAX_FRAME_LEN: usize = 8192;

// ── Messages ─────────────────────────────────────────────────────────

/// Messages exchanged on the pairing port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingMessage {
    /// Client opens the handshake and introduces itself.
    Request {
        client_name: String,
        service_name: String,
    },
    /// TV accepted the handshake; a pairing session now exists.
    Ack,
    /// TV is displaying a code and wants the secret exchange.
    SecretRequest,
    /// Client answers with the PIN digest (never the raw PIN).
    Secret { digest: [u8; 32] },
    /// TV confirmed the secret; the client certificate is now trusted.
    SecretAck,
    /// TV aborted the handshake.
    Error { reason: String },
}

/// Messages exchanged on the remote-control port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteMessage {
    /// Client opens the session.
    Configure { client_name: String },
    /// TV accepted the session and reports its display name.
    ConfigureAck { device_name: String },
    /// One key event.
    KeyEvent {
        key: KeyCode,
        direction: KeyDirection,
    },
    /// Keep-alive probe from the TV.
    Ping,
    /// Keep-alive answer.
    Pong,
}

// ── Codec ────────────────────────────────────────────────────────────

/// Varint-length-prefixed bincode codec for a single message type.
pub struct MessageCodec<T> {
    _marker: PhantomData<T>,
}

impl<T> MessageCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for MessageCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize> Encoder<T> for MessageCodec<T> {
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Error> {
        let payload = bincode::serialize(&item).map_err(|e| Error::Encoding(e.to_string()))?;
        if payload.len() > MAX_FRAME_LEN {
            return Err(Error::InvalidFrame {
                reason: format!("payload of {} bytes exceeds cap", payload.len()),
            });
        }

        let mut len = payload.len();
        loop {
            let byte = u8::try_from(len & 0x7f).unwrap_or(0);
            len >>= 7;
            if len == 0 {
                dst.put_u8(byte);
                break;
            }
            dst.put_u8(byte | 0x80);
        }
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

impl<T: DeserializeOwned> Decoder for MessageCodec<T> {
    type Item = T;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<T>, Error> {
        // Parse the varint header without consuming until the whole
        // frame is buffered.
        let mut len: usize = 0;
        let mut shift = 0u32;
        let mut header_len = 0usize;
        for (i, &byte) in src.iter().enumerate() {
            len |= usize::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                header_len = i + 1;
                break;
            }
            shift += 7;
            if shift > 21 {
                return Err(Error::InvalidFrame {
                    reason: "length varint too long".into(),
                });
            }
        }
        if header_len == 0 {
            return Ok(None);
        }
        if len > MAX_FRAME_LEN {
            return Err(Error::InvalidFrame {
                reason: format!("frame of {len} bytes exceeds cap"),
            });
        }
        if src.len() < header_len + len {
            src.reserve(header_len + len - src.len());
            return Ok(None);
        }

        src.advance(header_len);
        let payload = src.split_to(len);
        bincode::deserialize(&payload)
            .map(Some)
            .map_err(|e| Error::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode_one<T: Serialize>(msg: T) -> BytesMut {
        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(msg, &mut buf).expect("encode");
        buf
    }

    #[test]
    fn pairing_round_trip() {
        let msg = PairingMessage::Request {
            client_name: "telerc".into(),
            service_name: "telerc remote".into(),
        };
        let mut buf = encode_one(msg.clone());
        let mut codec = MessageCodec::<PairingMessage>::new();
        let decoded = codec.decode(&mut buf).expect("decode").expect("complete");
        assert_eq!(decoded, msg);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_full_frame() {
        let buf = encode_one(RemoteMessage::ConfigureAck {
            device_name: "Living Room".into(),
        });
        let mut codec = MessageCodec::<RemoteMessage>::new();

        // Feed the frame one byte at a time; only the last byte completes it.
        let mut partial = BytesMut::new();
        for (i, byte) in buf.iter().enumerate() {
            partial.put_u8(*byte);
            let result = codec.decode(&mut partial).expect("no error on partial");
            if i + 1 < buf.len() {
                assert!(result.is_none(), "decoded early at byte {i}");
            } else {
                assert!(result.is_some());
            }
        }
    }

    #[test]
    fn two_frames_in_one_buffer() {
        let mut buf = encode_one(RemoteMessage::Ping);
        buf.extend_from_slice(&encode_one(RemoteMessage::Pong));

        let mut codec = MessageCodec::<RemoteMessage>::new();
        assert_eq!(
            codec.decode(&mut buf).expect("first").expect("some"),
            RemoteMessage::Ping
        );
        assert_eq!(
            codec.decode(&mut buf).expect("second").expect("some"),
            RemoteMessage::Pong
        );
        assert!(codec.decode(&mut buf).expect("drained").is_none());
    }

    #[test]
    fn multi_byte_varint_length() {
        // A payload beyond 127 bytes forces a two-byte varint header.
        let msg = PairingMessage::Error {
            reason: "x".repeat(300),
        };
        let mut buf = encode_one(msg.clone());
        assert!(buf[0] & 0x80 != 0, "first header byte has continuation bit");

        let mut codec = MessageCodec::<PairingMessage>::new();
        let decoded = codec.decode(&mut buf).expect("decode").expect("complete");
        assert_eq!(decoded, msg);
    }

    #[test]
    fn oversize_frame_rejected() {
        // Hand-craft a header claiming a frame far beyond the cap.
        let mut buf = BytesMut::new();
        buf.put_u8(0xff);
        buf.put_u8(0xff);
        buf.put_u8(0x7f);
        let mut codec = MessageCodec::<RemoteMessage>::new();
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::InvalidFrame { .. }));
    }

    #[test]
    fn oversize_payload_refused_on_encode() {
        let msg = PairingMessage::Error {
            reason: "x".repeat(MAX_FRAME_LEN + 1),
        };
        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::new();
        assert!(matches!(
            codec.encode(msg, &mut buf),
            Err(Error::InvalidFrame { .. })
        ));
    }
}
