//! The QUIC transport boundary: listening, accepting, opening streams,
//! and TLS configuration. Everything in this module is plumbing around
//! `quinn`/`rustls`; the fan-out engine in [`crate::event`] and
//! [`crate::worker`] never depends on it directly (they are generic over
//! any `AsyncWrite + Unpin + Send` stream).

pub mod quic;
pub mod tls;

pub use quic::{Listener, TransportError};
