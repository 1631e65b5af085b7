//! Prelude module for convenient imports.
//!
//! ```rust
//! use streamhub::prelude::*;
//! ```
//!
//! ## Configuration
//! - [`BrokerConfig`] / [`BrokerConfigBuilder`] — declared topics and tunables
//!
//! ## Server
//! - [`BrokerServer`] — the broker core
//! - [`HandleOutcome`] — result of running one connection's subscribe handshake
//!
//! ## Policy
//! - [`Authenticator`] / [`Authorizer`] — host-supplied predicates
//! - [`allow_all_authenticator`] / [`allow_all_authorizer`] — accept-all defaults
//!
//! ## Metrics
//! - [`MetricsSink`] — the narrow counter/gauge interface
//! - [`NoopMetricsSink`] / [`AtomicMetricsSink`] — bundled implementations
//!
//! ## Wire types
//! - [`Event`] / [`ErrorPayload`] — framed record types
//! - [`Offer`] — the connection handshake payload
//!
//! ## Errors
//! - [`BrokerError`] — construction and listen-time failures

pub use crate::auth::{allow_all_authenticator, allow_all_authorizer, Authenticator, Authorizer};
pub use crate::config::{BrokerConfig, BrokerConfigBuilder};
pub use crate::error::BrokerError;
pub use crate::framing::{ErrorPayload, Event};
pub use crate::metrics::{AtomicMetricsSink, MetricsSink, NoopMetricsSink};
pub use crate::offer::Offer;
pub use crate::server::{BrokerServer, HandleOutcome};
