//! # streamhub — topic-based publish/subscribe broker over QUIC
//!
//! A lightweight broker that fans out topic-scoped byte payloads from a
//! single publisher process to many subscriber connections. Subscribers
//! connect over QUIC, authenticate with an opaque token, offer the topic
//! patterns they want, and are authorized per topic; the broker then
//! streams matching events to each subscriber's outbound stream until the
//! connection fails.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use streamhub::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BrokerConfig::builder()
//!         .with_topics(["ride.accepted", "ride.rejected"])
//!         .build()?;
//!
//!     let server = BrokerServer::serve("0.0.0.0:4433".parse()?, config).await?;
//!     server.set_authenticator(Arc::new(|token: &str| token == "expected-token"));
//!
//!     server.publish("ride.accepted", b"driver en route".to_vec()).await;
//!     Ok(())
//! }
//! ```
//!
//! # Module organization
//!
//! ## Distribution engine
//! - [`topic`] — pure pattern/topic matching (`hasWildcard`, `matchList`, `matchRelatedWildcards`)
//! - [`event`] — per-topic `EventSource` fan-out hub and its distributor/admitter/cleaner tasks
//! - [`subscriber`] — the per-connection outbound stream handle
//! - [`worker`] — the bounded distribute worker pool and its job type
//! - [`offer`] — the connection handshake reader
//! - [`framing`] — delimited JSON record codec
//! - [`server`] — `BrokerServer`: owns the listener, routing, and lifecycle
//!
//! ## Transport and policy (external collaborators)
//! - [`transport`] — QUIC listener/connection adapters and TLS defaults
//! - [`auth`] — `Authenticator`/`Authorizer` predicate traits
//! - [`metrics`] — the narrow counter/gauge sink the core emits through
//! - [`client`] — reference client-side dispatcher
//!
//! ## Ambient
//! - [`config`] — `BrokerConfig` and its builder
//! - [`error`] — top-level `BrokerError`
//! - [`util`] — identifier newtypes
//!
//! # Design principles
//!
//! - **No persistence, no replay, no clustering.** Delivery is
//!   best-effort once per subscriber; a slow or dead subscriber is
//!   isolated by marking it corrupt, never by blocking the rest.
//! - **Per-source FIFO, not global FIFO.** Events are ordered within one
//!   topic's distribution, never across topics.
//! - **The core never owns policy.** Authentication, authorization, and
//!   metrics export are host-supplied; the broker only invokes narrow
//!   interfaces for them.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod framing;
pub mod metrics;
pub mod offer;
pub mod prelude;
pub mod server;
pub mod subscriber;
pub mod topic;
pub mod transport;
pub mod util;
pub mod worker;
