//! QUIC transport adapters: a thin wrapper over `quinn` providing exactly
//! the operations the broker needs (listen, accept, open a unidirectional
//! stream, close with an application error code) — everything else about
//! QUIC is `quinn`'s concern, per spec's Out-of-scope.

// Layer 1: Standard library imports
use std::net::SocketAddr;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use quinn::{Connection, Endpoint, RecvStream, SendStream, VarInt};
use thiserror::Error;

use super::tls::ALPN_PROTOCOL;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind QUIC endpoint on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build QUIC server crypto config: {0}")]
    Crypto(String),

    #[error("failed to accept connection: {0}")]
    Accept(#[source] quinn::ConnectionError),

    #[error("failed to open outbound stream: {0}")]
    OpenStream(#[source] quinn::ConnectionError),

    #[error("failed to accept inbound stream: {0}")]
    AcceptStream(#[source] quinn::ConnectionError),
}

/// Listens for incoming QUIC connections on one bound UDP socket.
pub struct Listener {
    endpoint: Endpoint,
}

impl Listener {
    /// Binds a server endpoint using `tls` for the handshake. ALPN is set
    /// by the caller-supplied config (see [`super::tls::default_server_tls_config`]).
    pub fn bind(address: SocketAddr, tls: rustls::ServerConfig) -> Result<Self, TransportError> {
        let mut tls = tls;
        if tls.alpn_protocols.is_empty() {
            tls.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
        }

        let quic_crypto = quinn::crypto::rustls::QuicServerConfig::try_from(tls)
            .map_err(|err| TransportError::Crypto(err.to_string()))?;
        let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_crypto));

        let endpoint = Endpoint::server(server_config, address)
            .map_err(|source| TransportError::Bind { address, source })?;

        Ok(Self { endpoint })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Awaits the next incoming connection. Returns `None` once the
    /// endpoint has been closed.
    pub async fn accept(&self) -> Option<Result<Connection, TransportError>> {
        let incoming = self.endpoint.accept().await?;
        Some(
            incoming
                .await
                .map_err(TransportError::Accept),
        )
    }
}

/// Opens the broker's single outbound unidirectional stream (the event
/// feed) on an already-established connection.
pub async fn open_event_stream(connection: &Connection) -> Result<SendStream, TransportError> {
    connection
        .open_uni()
        .await
        .map_err(TransportError::OpenStream)
}

/// Awaits the client's first inbound unidirectional stream (the offer).
pub async fn accept_offer_stream(connection: &Connection) -> Result<RecvStream, TransportError> {
    connection
        .accept_uni()
        .await
        .map_err(TransportError::AcceptStream)
}

/// Closes a connection with an application error code, per spec §6's
/// close-code table.
pub fn close_with_code(connection: &Connection, code: i32, reason: &str) {
    connection.close(VarInt::from_u32(code as u32), reason.as_bytes());
}
