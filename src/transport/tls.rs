//! Ephemeral TLS configuration: a self-signed RSA-2048 server certificate
//! generated at startup, and an insecure client verifier for the baseline
//! contract spec §6 describes.
//!
//! Grounded on `tls.go`'s `GetDefaultTLSConfig`/`GetSimpleTLS`: the ALPN
//! protocol string and the "accept anything" client default carry over
//! unchanged; certificate generation uses `rcgen` instead of hand-rolling
//! `crypto/x509` calls.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use rcgen::{CertifiedKey, KeyPair};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};

/// ALPN protocol identifier used by every connection this crate opens or
/// accepts, matching the original's `protocol` constant.
pub const ALPN_PROTOCOL: &[u8] = b"PROTOCOL_QUIC";

/// Builds a server TLS config backed by a freshly generated, ephemeral
/// self-signed RSA-2048 certificate. Each call produces a distinct key
/// pair; there is no persistence across restarts.
pub fn default_server_tls_config() -> Result<rustls::ServerConfig, String> {
    let key_pair = KeyPair::generate_for(&rcgen::PKCS_RSA_SHA256)
        .map_err(|err| format!("failed to generate RSA key pair: {err}"))?;

    let CertifiedKey { cert, signing_key } = rcgen::CertificateParams::new(Vec::new())
        .map_err(|err| format!("failed to build certificate params: {err}"))?
        .self_signed(&key_pair)
        .map(|cert| CertifiedKey { cert, signing_key: key_pair })
        .map_err(|err| format!("failed to self-sign certificate: {err}"))?;

    let cert_der = CertificateDer::from(cert.der().to_vec());
    let key_der = rustls::pki_types::PrivateKeyDer::Pkcs8(
        signing_key.serialize_der().into(),
    );

    let mut config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der)
        .map_err(|err| format!("failed to build server TLS config: {err}"))?;

    config.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
    Ok(config)
}

/// Builds a client TLS config that skips server certificate verification
/// entirely, matching `GetSimpleTLS`'s `InsecureSkipVerify: true` default.
/// Not recommended for production; this is the baseline contract spec §6
/// documents, not a security recommendation.
pub fn insecure_client_tls_config() -> rustls::ClientConfig {
    let mut config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();

    config.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
    config
}

#[derive(Debug)]
struct AcceptAnyServerCert;

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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_config_carries_the_alpn_protocol() {
        let config = default_server_tls_config().unwrap();
        assert_eq!(config.alpn_protocols, vec![ALPN_PROTOCOL.to_vec()]);
    }

    #[test]
    fn insecure_client_config_carries_the_alpn_protocol() {
        let config = insecure_client_tls_config();
        assert_eq!(config.alpn_protocols, vec![ALPN_PROTOCOL.to_vec()]);
    }

    #[test]
    fn server_config_can_be_generated_repeatedly() {
        assert!(default_server_tls_config().is_ok());
        assert!(default_server_tls_config().is_ok());
    }
}
