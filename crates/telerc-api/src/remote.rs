//! Protocol client: pairing and session legs over TLS.
//!
//! The engine drives a [`RemoteTransport`] and consumes
//! [`TransportEvent`]s from a channel — the protocol's callback surface
//! reduced to one tagged variant consumed at a single dispatch point.
//! [`RemoteClient`] is the real implementation; tests substitute fakes.
//!
//! A client carries at most one live leg (pairing *or* session); opening
//! a new leg supersedes the previous one. Teardown is cooperative via
//! [`CancellationToken`] — in-flight socket reads observe the cancel and
//! close without emitting stale events.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::identity::{ClientIdentity, secret_digest};
use crate::keycode::{KeyCode, KeyDirection};
use crate::transport::{self, TransportConfig};
use crate::wire::{MessageCodec, PairingMessage, RemoteMessage};

const OUTBOUND_CHANNEL_SIZE: usize = 16;

// ── Events ───────────────────────────────────────────────────────────

/// Asynchronous lifecycle signals emitted by a transport leg.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A connection attempt is starting.
    ConnectingToRemote,
    /// The TV accepted the pairing handshake; a pairing session exists.
    SessionCreated,
    /// The TV is displaying a PIN and awaits the secret.
    SecretRequested,
    /// Pairing completed. Carries the PEM credential bundle so the
    /// engine — the only writer of the credential store — can persist it.
    Paired { identity: Vec<u8> },
    /// The operational session is established.
    Connected { device_name: String },
    /// The peer closed the connection.
    Disconnected,
    /// The leg failed. The message is classified centrally by the engine.
    Error { message: String },
}

/// Which handshake a connection attempt performs.
pub enum ConnectLeg {
    /// First contact: generate a fresh identity and run the PIN exchange.
    Pairing,
    /// Operational session using the persisted identity.
    Session { identity: ClientIdentity },
}

impl std::fmt::Debug for ConnectLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pairing => f.write_str("Pairing"),
            Self::Session { .. } => f.write_str("Session"),
        }
    }
}

// ── Transport trait ──────────────────────────────────────────────────

/// Seam between the engine and the protocol client.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Open a leg toward `address`, superseding any live leg.
    ///
    /// Returns once the handshake has been started; the rest of the
    /// lifecycle arrives on `events`. Dial and TLS failures are returned
    /// directly so the caller can classify them.
    async fn connect(
        &self,
        address: &str,
        leg: ConnectLeg,
        events: mpsc::Sender<TransportEvent>,
        cancel: CancellationToken,
    ) -> Result<(), Error>;

    /// Forward the operator-entered PIN on the live pairing leg.
    async fn send_secret(&self, pin: &str) -> Result<(), Error>;

    /// Send one key event on the live session leg.
    async fn send_key(&self, key: KeyCode, direction: KeyDirection) -> Result<(), Error>;

    /// Tear down the live leg, if any. Idempotent.
    async fn disconnect(&self);
}

// ── RemoteClient ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegKind {
    Pairing,
    Session,
}

enum Outbound {
    Pairing(PairingMessage),
    Remote(RemoteMessage),
}

struct LiveLeg {
    kind: LegKind,
    outbound: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
    /// Certificate of the pairing identity, for the secret digest.
    pairing_cert_der: Option<Vec<u8>>,
}

/// The real protocol client.
pub struct RemoteClient {
    config: TransportConfig,
    client_name: String,
    live: Mutex<Option<LiveLeg>>,
}

impl RemoteClient {
    pub fn new(config: TransportConfig, client_name: impl Into<String>) -> Self {
        Self {
            config,
            client_name: client_name.into(),
            live: Mutex::new(None),
        }
    }

    async fn open_pairing(
        &self,
        address: &str,
        events: mpsc::Sender<TransportEvent>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        let identity = ClientIdentity::generate(&self.client_name)?;
        let connector = transport::build_connector(&identity)?;
        let name = transport::server_name(address)?;

        let tcp = TcpStream::connect((address, self.config.pairing_port)).await?;
        let tls = connector
            .connect(name, tcp)
            .await
            .map_err(|e| Error::Tls(format!("handshake failed during pairing: {e}")))?;
        debug!(address, port = self.config.pairing_port, "pairing leg open");

        let framed = Framed::new(tls, MessageCodec::<PairingMessage>::new());
        let (sink, stream) = framed.split();

        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);
        out_tx
            .send(Outbound::Pairing(PairingMessage::Request {
                client_name: self.client_name.clone(),
                service_name: format!("{} remote", self.client_name),
            }))
            .await
            .map_err(|_| Error::Closed)?;

        tokio::spawn(writer_task(sink_pairing(sink), out_rx, cancel.clone()));
        tokio::spawn(pairing_reader_task(
            stream,
            events,
            cancel.clone(),
            identity.as_pem_bundle().to_vec(),
        ));

        *self.live.lock().await = Some(LiveLeg {
            kind: LegKind::Pairing,
            outbound: out_tx,
            cancel,
            pairing_cert_der: Some(identity.cert_der().to_vec()),
        });
        Ok(())
    }

    async fn open_session(
        &self,
        address: &str,
        identity: ClientIdentity,
        events: mpsc::Sender<TransportEvent>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        let connector = transport::build_connector(&identity)?;
        let name = transport::server_name(address)?;

        let tcp = TcpStream::connect((address, self.config.remote_port)).await?;
        let tls = connector
            .connect(name, tcp)
            .await
            .map_err(|e| Error::Tls(format!("error during remote connection: {e}")))?;
        debug!(address, port = self.config.remote_port, "session leg open");

        let framed = Framed::new(tls, MessageCodec::<RemoteMessage>::new());
        let (sink, stream) = framed.split();

        let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CHANNEL_SIZE);
        out_tx
            .send(Outbound::Remote(RemoteMessage::Configure {
                client_name: self.client_name.clone(),
            }))
            .await
            .map_err(|_| Error::Closed)?;

        tokio::spawn(writer_task(sink_remote(sink), out_rx, cancel.clone()));
        tokio::spawn(session_reader_task(
            stream,
            events,
            cancel.clone(),
            out_tx.clone(),
        ));

        *self.live.lock().await = Some(LiveLeg {
            kind: LegKind::Session,
            outbound: out_tx,
            cancel,
            pairing_cert_der: None,
        });
        Ok(())
    }
}

#[async_trait]
impl RemoteTransport for RemoteClient {
    async fn connect(
        &self,
        address: &str,
        leg: ConnectLeg,
        events: mpsc::Sender<TransportEvent>,
        cancel: CancellationToken,
    ) -> Result<(), Error> {
        // Supersede any previous leg: one live handshake at a time.
        self.disconnect().await;

        let _ = events.send(TransportEvent::ConnectingToRemote).await;
        match leg {
            ConnectLeg::Pairing => self.open_pairing(address, events, cancel).await,
            ConnectLeg::Session { identity } => {
                self.open_session(address, identity, events, cancel).await
            }
        }
    }

    async fn send_secret(&self, pin: &str) -> Result<(), Error> {
        let guard = self.live.lock().await;
        let leg = guard.as_ref().ok_or(Error::NotConnected)?;
        let cert_der = leg.pairing_cert_der.as_ref().ok_or(Error::NotConnected)?;
        let digest = secret_digest(pin, cert_der);
        leg.outbound
            .send(Outbound::Pairing(PairingMessage::Secret { digest }))
            .await
            .map_err(|_| Error::Closed)
    }

    async fn send_key(&self, key: KeyCode, direction: KeyDirection) -> Result<(), Error> {
        let guard = self.live.lock().await;
        let leg = guard.as_ref().ok_or(Error::NotConnected)?;
        if leg.kind != LegKind::Session {
            return Err(Error::NotConnected);
        }
        leg.outbound
            .send(Outbound::Remote(RemoteMessage::KeyEvent { key, direction }))
            .await
            .map_err(|_| Error::Closed)
    }

    async fn disconnect(&self) {
        if let Some(leg) = self.live.lock().await.take() {
            debug!(kind = ?leg.kind, "closing transport leg");
            leg.cancel.cancel();
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

type TlsLink = tokio_rustls::client::TlsStream<TcpStream>;
type PairingSink = futures_util::stream::SplitSink<Framed<TlsLink, MessageCodec<PairingMessage>>, PairingMessage>;
type PairingStream = futures_util::stream::SplitStream<Framed<TlsLink, MessageCodec<PairingMessage>>>;
type RemoteSink = futures_util::stream::SplitSink<Framed<TlsLink, MessageCodec<RemoteMessage>>, RemoteMessage>;
type RemoteStream = futures_util::stream::SplitStream<Framed<TlsLink, MessageCodec<RemoteMessage>>>;

enum AnySink {
    Pairing(PairingSink),
    Remote(RemoteSink),
}

fn sink_pairing(sink: PairingSink) -> AnySink {
    AnySink::Pairing(sink)
}

fn sink_remote(sink: RemoteSink) -> AnySink {
    AnySink::Remote(sink)
}

impl AnySink {
    async fn send(&mut self, msg: Outbound) -> Result<(), Error> {
        match (self, msg) {
            (Self::Pairing(sink), Outbound::Pairing(m)) => sink.send(m).await,
            (Self::Remote(sink), Outbound::Remote(m)) => sink.send(m).await,
            // A message for the wrong leg kind is a programming error on
            // our side; drop it rather than poison the stream.
            _ => {
                warn!("outbound message for mismatched leg kind dropped");
                Ok(())
            }
        }
    }
}

/// Drain the outbound channel into the socket until cancel or error.
async fn writer_task(
    mut sink: AnySink,
    mut out_rx: mpsc::Receiver<Outbound>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            msg = out_rx.recv() => {
                let Some(msg) = msg else { break };
                if let Err(e) = sink.send(msg).await {
                    warn!(error = %e, "outbound write failed");
                    break;
                }
            }
        }
    }
}

/// Consume the pairing stream and translate it into events.
async fn pairing_reader_task(
    mut stream: PairingStream,
    events: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
    identity_pem: Vec<u8>,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            frame = stream.next() => {
                match frame {
                    Some(Ok(PairingMessage::Ack)) => {
                        let _ = events.send(TransportEvent::SessionCreated).await;
                    }
                    Some(Ok(PairingMessage::SecretRequest)) => {
                        let _ = events.send(TransportEvent::SecretRequested).await;
                    }
                    Some(Ok(PairingMessage::SecretAck)) => {
                        let _ = events
                            .send(TransportEvent::Paired { identity: identity_pem })
                            .await;
                        // The pairing leg is done; the TV closes it and the
                        // engine opens the operational session.
                        return;
                    }
                    Some(Ok(PairingMessage::Error { reason })) => {
                        let _ = events
                            .send(TransportEvent::Error {
                                message: format!("Pairing Error: {reason}"),
                            })
                            .await;
                        return;
                    }
                    Some(Ok(other)) => {
                        trace!(?other, "ignoring unexpected pairing message");
                    }
                    Some(Err(e)) => {
                        let _ = events
                            .send(TransportEvent::Error {
                                message: format!("Pairing Error: {e}"),
                            })
                            .await;
                        return;
                    }
                    None => {
                        let _ = events.send(TransportEvent::Disconnected).await;
                        return;
                    }
                }
            }
        }
    }
}

/// Consume the session stream and translate it into events.
async fn session_reader_task(
    mut stream: RemoteStream,
    events: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
    out_tx: mpsc::Sender<Outbound>,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            frame = stream.next() => {
                match frame {
                    Some(Ok(RemoteMessage::ConfigureAck { device_name })) => {
                        let _ = events
                            .send(TransportEvent::Connected { device_name })
                            .await;
                    }
                    Some(Ok(RemoteMessage::Ping)) => {
                        let _ = out_tx.send(Outbound::Remote(RemoteMessage::Pong)).await;
                    }
                    Some(Ok(other)) => {
                        trace!(?other, "ignoring unexpected session message");
                    }
                    Some(Err(e)) => {
                        let _ = events
                            .send(TransportEvent::Error {
                                message: format!("Remote Session Error: {e}"),
                            })
                            .await;
                        return;
                    }
                    None => {
                        let _ = events.send(TransportEvent::Disconnected).await;
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_key_without_leg_is_not_connected() {
        let client = RemoteClient::new(TransportConfig::default(), "telerc");
        let err = client
            .send_key(KeyCode::Power, KeyDirection::Short)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn send_secret_without_pairing_leg_is_not_connected() {
        let client = RemoteClient::new(TransportConfig::default(), "telerc");
        let err = client.send_secret("1234").await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn disconnect_without_leg_is_noop() {
        let client = RemoteClient::new(TransportConfig::default(), "telerc");
        client.disconnect().await;
        client.disconnect().await;
    }
}
