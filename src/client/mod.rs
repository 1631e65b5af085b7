//! Reference client-side pieces. Outside the broker core's boundary
//! (spec's Out-of-scope), but part of the published wire contract.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, DispatcherError};
