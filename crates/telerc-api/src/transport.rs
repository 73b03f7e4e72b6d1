// ── TLS transport configuration ──
//
// TVs present self-signed certificates and identify *us* by the client
// certificate confirmed during pairing. Server trust therefore does not
// come from PKI: the connector accepts any server certificate, and the
// security of the link rests on the paired client identity plus the
// PIN-bound secret exchange.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;

use crate::error::Error;
use crate::identity::ClientIdentity;

/// Ports of the remote protocol.
///
/// The operational session and the pairing handshake run on distinct
/// ports; both values come from the protocol, not from us.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Operational remote-control session.
    pub remote_port: u16,
    /// Pairing handshake.
    pub pairing_port: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            remote_port: 6466,
            pairing_port: 6467,
        }
    }
}

/// Build a TLS connector authenticating with `identity`.
pub(crate) fn build_connector(identity: &ClientIdentity) -> Result<TlsConnector, Error> {
    let provider = rustls::crypto::ring::default_provider();
    let algorithms = provider.signature_verification_algorithms;

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("protocol setup failed: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { algorithms }))
        .with_client_auth_cert(identity.cert_chain(), identity.private_key()?)
        .map_err(|e| Error::Tls(format!("client certificate rejected: {e}")))?;

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Parse `address` into a TLS server name (DNS name or IP literal).
pub(crate) fn server_name(address: &str) -> Result<ServerName<'static>, Error> {
    ServerName::try_from(address.to_owned())
        .map_err(|_| Error::InvalidAddress(address.to_owned()))
}

/// Verifier that accepts any server certificate but still validates
/// handshake signatures against it.
#[derive(Debug)]
struct AcceptAnyServerCert {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}
