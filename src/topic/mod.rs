//! Topic matcher: pure functions linking publish patterns to subscribe
//! patterns. Used by the publish router ([`crate::server::BrokerServer::publish`])
//! and by the reference client dispatcher ([`crate::client::dispatcher`]).

pub mod matcher;

pub use matcher::{has_wildcard, match_list, match_related_wildcards};
