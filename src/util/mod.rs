//! Small identifier utilities shared across broker modules.

pub mod ids;

pub use ids::{ConnectionId, SubscriberId};
