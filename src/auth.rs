//! Authentication and authorization predicates.
//!
//! The core never contains authentication or authorization logic itself;
//! it only invokes host-supplied predicates. Per the design notes these
//! are modeled as function-value fields rather than generic type
//! parameters on [`crate::server::BrokerServer`] — unlike the runtime
//! crate's usual avoidance of `dyn`, a predicate that the server can swap
//! out at runtime via `set_authenticator`/`set_authorizer` needs dynamic
//! dispatch; there is no single concrete type to monomorphize over.

// Layer 1: Standard library imports
use std::sync::Arc;

/// Authenticates a client's opaque token at connection time.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> bool;
}

impl<F> Authenticator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn authenticate(&self, token: &str) -> bool {
        self(token)
    }
}

/// Authorizes a client for one requested topic.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, token: &str, topic: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn authorize(&self, token: &str, topic: &str) -> bool {
        self(token, topic)
    }
}

/// Accepts every token. The broker's default authenticator.
pub fn allow_all_authenticator() -> Arc<dyn Authenticator> {
    Arc::new(|_token: &str| true)
}

/// Authorizes every token for every topic. The broker's default authorizer.
pub fn allow_all_authorizer() -> Arc<dyn Authorizer> {
    Arc::new(|_token: &str, _topic: &str| true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_authenticator_accepts_all() {
        let auth = allow_all_authenticator();
        assert!(auth.authenticate(""));
        assert!(auth.authenticate("whatever"));
    }

    #[test]
    fn default_authorizer_accepts_all() {
        let authz = allow_all_authorizer();
        assert!(authz.authorize("t", "any.topic"));
    }

    #[test]
    fn closure_implements_authenticator() {
        let auth: Arc<dyn Authenticator> = Arc::new(|token: &str| token == "secret");
        assert!(auth.authenticate("secret"));
        assert!(!auth.authenticate("other"));
    }

    #[test]
    fn closure_implements_authorizer() {
        let authz: Arc<dyn Authorizer> = Arc::new(|token: &str, topic: &str| token == "t" && topic == "a");
        assert!(authz.authorize("t", "a"));
        assert!(!authz.authorize("t", "b"));
    }
}
