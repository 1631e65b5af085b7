//! Top-level broker errors: construction and listen-time failures.
//!
//! Per-module protocol/transport failures have their own narrower error
//! enums ([`crate::offer::OfferError`], [`crate::framing::FramingError`],
//! [`crate::transport::TransportError`]); `BrokerError` is what
//! [`crate::server::BrokerServer::new`], `serve`, and
//! [`crate::config::BrokerConfig`] construction can fail with.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors that can prevent the broker from starting or from being
/// configured validly.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The listener failed to bind the requested address.
    #[error("failed to listen on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A [`crate::config::BrokerConfig`] field failed validation.
    #[error("invalid broker configuration: {reason}")]
    InvalidConfig { reason: String },

    /// TLS configuration could not be constructed.
    #[error("failed to build TLS configuration: {reason}")]
    Tls { reason: String },
}
