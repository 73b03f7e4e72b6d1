//! End-to-end tests for `RemoteClient` against an in-process fake TV.
//!
//! Real TCP + TLS sockets on loopback: the fake TV runs the server side
//! of the pairing and session handshakes with the same wire codec.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use telerc_api::wire::{MessageCodec, PairingMessage, RemoteMessage};
use telerc_api::{
    ClientIdentity, ConnectLeg, KeyCode, KeyDirection, RemoteClient, RemoteTransport,
    TransportConfig, TransportEvent,
};

fn tls_acceptor() -> TlsAcceptor {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["tv.local".to_owned()]).expect("tv cert");
    let certs = vec![cert.der().clone()];
    let key = rustls::pki_types::PrivateKeyDer::Pkcs8(
        rustls::pki_types::PrivatePkcs8KeyDer::from(key_pair.serialize_der()),
    );
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .expect("protocol versions")
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .expect("server identity");
    TlsAcceptor::from(Arc::new(config))
}

async fn next_event(events: &mut mpsc::Receiver<TransportEvent>) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within deadline")
        .expect("event channel open")
}

/// Fake TV pairing endpoint: Request → Ack + SecretRequest → Secret → SecretAck.
async fn fake_tv_pairing(listener: TcpListener, acceptor: TlsAcceptor, accept_secret: bool) {
    let (tcp, _) = listener.accept().await.expect("accept");
    let tls = acceptor.accept(tcp).await.expect("tls accept");
    let mut framed = Framed::new(tls, MessageCodec::<PairingMessage>::new());

    match framed.next().await {
        Some(Ok(PairingMessage::Request { client_name, .. })) => {
            assert!(!client_name.is_empty());
        }
        other => panic!("expected pairing request, got {other:?}"),
    }
    framed.send(PairingMessage::Ack).await.expect("ack");
    framed
        .send(PairingMessage::SecretRequest)
        .await
        .expect("secret request");

    match framed.next().await {
        Some(Ok(PairingMessage::Secret { digest })) => {
            assert_ne!(digest, [0u8; 32], "digest must not be empty");
        }
        other => panic!("expected secret, got {other:?}"),
    }

    if accept_secret {
        framed.send(PairingMessage::SecretAck).await.expect("ack");
    } else {
        framed
            .send(PairingMessage::Error {
                reason: "Secret incorrect".into(),
            })
            .await
            .expect("error");
    }
}

/// Fake TV session endpoint: Configure → ConfigureAck, then forward keys.
async fn fake_tv_session(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    keys: mpsc::Sender<KeyCode>,
) {
    let (tcp, _) = listener.accept().await.expect("accept");
    let tls = acceptor.accept(tcp).await.expect("tls accept");
    let mut framed = Framed::new(tls, MessageCodec::<RemoteMessage>::new());

    match framed.next().await {
        Some(Ok(RemoteMessage::Configure { .. })) => {}
        other => panic!("expected configure, got {other:?}"),
    }
    framed
        .send(RemoteMessage::ConfigureAck {
            device_name: "Living Room".into(),
        })
        .await
        .expect("configure ack");

    while let Some(Ok(msg)) = framed.next().await {
        if let RemoteMessage::KeyEvent { key, .. } = msg {
            let _ = keys.send(key).await;
        }
    }
}

#[tokio::test]
async fn pairs_then_connects_and_sends_a_key() {
    let pairing_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let remote_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let config = TransportConfig {
        pairing_port: pairing_listener.local_addr().expect("addr").port(),
        remote_port: remote_listener.local_addr().expect("addr").port(),
    };

    let acceptor = tls_acceptor();
    tokio::spawn(fake_tv_pairing(pairing_listener, acceptor.clone(), true));
    let (key_tx, mut key_rx) = mpsc::channel(4);
    tokio::spawn(fake_tv_session(remote_listener, acceptor, key_tx));

    let client = RemoteClient::new(config, "telerc test");
    let (events_tx, mut events) = mpsc::channel(32);

    // Pairing leg.
    client
        .connect(
            "127.0.0.1",
            ConnectLeg::Pairing,
            events_tx.clone(),
            CancellationToken::new(),
        )
        .await
        .expect("pairing connect");

    assert!(matches!(
        next_event(&mut events).await,
        TransportEvent::ConnectingToRemote
    ));
    assert!(matches!(
        next_event(&mut events).await,
        TransportEvent::SessionCreated
    ));
    assert!(matches!(
        next_event(&mut events).await,
        TransportEvent::SecretRequested
    ));

    client.send_secret("1234").await.expect("send secret");
    let bundle = match next_event(&mut events).await {
        TransportEvent::Paired { identity } => identity,
        other => panic!("expected paired, got {other:?}"),
    };

    // Session leg with the identity the pairing produced.
    let identity = ClientIdentity::from_pem_bundle(&bundle).expect("artifact parses");
    client
        .connect(
            "127.0.0.1",
            ConnectLeg::Session { identity },
            events_tx.clone(),
            CancellationToken::new(),
        )
        .await
        .expect("session connect");

    assert!(matches!(
        next_event(&mut events).await,
        TransportEvent::ConnectingToRemote
    ));
    match next_event(&mut events).await {
        TransportEvent::Connected { device_name } => assert_eq!(device_name, "Living Room"),
        other => panic!("expected connected, got {other:?}"),
    }

    client
        .send_key(KeyCode::VolumeUp, KeyDirection::Short)
        .await
        .expect("send key");
    let key = tokio::time::timeout(Duration::from_secs(5), key_rx.recv())
        .await
        .expect("key within deadline")
        .expect("key channel open");
    assert_eq!(key, KeyCode::VolumeUp);

    client.disconnect().await;
}

#[tokio::test]
async fn rejected_secret_surfaces_a_pairing_error() {
    let pairing_listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let config = TransportConfig {
        pairing_port: pairing_listener.local_addr().expect("addr").port(),
        remote_port: 1,
    };
    tokio::spawn(fake_tv_pairing(pairing_listener, tls_acceptor(), false));

    let client = RemoteClient::new(config, "telerc test");
    let (events_tx, mut events) = mpsc::channel(32);
    client
        .connect(
            "127.0.0.1",
            ConnectLeg::Pairing,
            events_tx,
            CancellationToken::new(),
        )
        .await
        .expect("pairing connect");

    loop {
        match next_event(&mut events).await {
            TransportEvent::Error { message } => {
                assert!(message.starts_with("Pairing Error:"), "got: {message}");
                assert!(message.contains("Secret incorrect"));
                break;
            }
            TransportEvent::SecretRequested => {
                client.send_secret("0000").await.expect("send secret");
            }
            TransportEvent::Paired { .. } => panic!("pairing must not succeed"),
            _ => {}
        }
    }
}

#[tokio::test]
async fn connect_to_closed_port_fails_with_reachability_error() {
    // Bind then drop to get a port nothing listens on.
    let probe = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = probe.local_addr().expect("addr").port();
    drop(probe);

    let config = TransportConfig {
        pairing_port: port,
        remote_port: port,
    };
    let client = RemoteClient::new(config, "telerc test");
    let (events_tx, _events) = mpsc::channel(8);

    let err = client
        .connect(
            "127.0.0.1",
            ConnectLeg::Pairing,
            events_tx,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(err.is_transient(), "refused connect is retryable: {err}");
}
